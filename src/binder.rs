//! Register one flag per leaf field and bind it to an environment variable.
//!
//! [`setup`] walks a [`Configure`] description in declaration order. For each
//! leaf it registers a flag holding a copy of the field's current value, binds
//! the field's environment name, records the current value as the explicit
//! default, and binds the flag so a changed flag wins over the environment.
//!
//! Nested structs extend the flag prefix with their own flag name
//! (`Server.Port` becomes `--server-port`) but leave the environment name
//! unprefixed (`PORT`). Two nested fields with the same derived env name
//! therefore share one settings key; give them explicit `env` names.
//! Embedded structs keep the parent's prefix.
//!
//! Setup stops at the first failure. Fields processed before it stay
//! registered.

use std::collections::HashMap;

use toml::{Table, Value};
use tracing::{debug, trace};

use crate::error::FlagenvError;
use crate::field::{Configure, Names, Slot};
use crate::flags::FlagSet;
use crate::map::{Int64Map, StringMap};
use crate::settings::Settings;
use crate::value::{FlagValue, Scalar, ScalarValue, StringSliceValue};

/// Bind every field of `config` to a flag in `flags` and a key in `settings`.
pub fn setup(
    flags: &mut FlagSet,
    settings: &mut Settings,
    config: &mut dyn Configure,
) -> Result<(), FlagenvError> {
    setup_with_prefix(flags, settings, config, "")
}

fn setup_with_prefix(
    flags: &mut FlagSet,
    settings: &mut Settings,
    config: &mut dyn Configure,
    prefix: &str,
) -> Result<(), FlagenvError> {
    for field in config.fields() {
        let (meta, slot) = field.into_parts();
        let names = meta.names()?;
        let flag_name = if prefix.is_empty() {
            names.flag.clone()
        } else {
            format!("{prefix}-{}", names.flag)
        };

        match slot {
            Slot::Nested(inner) => {
                trace!(field = %meta.ident, prefix = %flag_name, "entering nested struct");
                setup_with_prefix(flags, settings, inner, &flag_name).map_err(|e| {
                    FlagenvError::Nested {
                        field: meta.ident.clone(),
                        source: Box::new(e),
                    }
                })?;
            }
            Slot::Embedded(inner) => {
                trace!(field = %meta.ident, prefix, "entering embedded struct");
                setup_with_prefix(flags, settings, inner, prefix).map_err(|e| {
                    FlagenvError::Nested {
                        field: meta.ident.clone(),
                        source: Box::new(e),
                    }
                })?;
            }
            Slot::Unsupported(type_name) => {
                return Err(FlagenvError::UnsupportedType {
                    field: meta.ident,
                    type_name,
                });
            }
            leaf => {
                if let Some((value, default)) = leaf_value(&leaf) {
                    bind(flags, settings, &names, &flag_name, value, default)?;
                }
            }
        }
    }
    Ok(())
}

fn scalar<T: Scalar>(current: &T) -> Option<(Box<dyn FlagValue>, Value)> {
    let value = ScalarValue::new(current.clone());
    let default = value.to_setting();
    Some((Box::new(value), default))
}

fn map_default<V: Clone + Into<Value>>(map: &HashMap<String, V>) -> Value {
    Value::Table(
        map.iter()
            .map(|(k, v)| (k.clone(), v.clone().into()))
            .collect::<Table>(),
    )
}

/// The flag value for a leaf slot, and the default recorded for its key.
fn leaf_value(slot: &Slot<'_>) -> Option<(Box<dyn FlagValue>, Value)> {
    match slot {
        Slot::String(v) => scalar(&**v),
        Slot::Bool(v) => scalar(&**v),
        Slot::I8(v) => scalar(&**v),
        Slot::I16(v) => scalar(&**v),
        Slot::I32(v) => scalar(&**v),
        Slot::I64(v) => scalar(&**v),
        Slot::Isize(v) => scalar(&**v),
        Slot::U8(v) => scalar(&**v),
        Slot::U16(v) => scalar(&**v),
        Slot::U32(v) => scalar(&**v),
        Slot::U64(v) => scalar(&**v),
        Slot::Usize(v) => scalar(&**v),
        Slot::F64(v) => scalar(&**v),
        Slot::Duration(v) => scalar(&**v),
        Slot::Strings(v) => {
            let value = StringSliceValue::new(v.to_vec());
            let default = value.to_setting();
            Some((Box::new(value), default))
        }
        Slot::StringMap(m) => Some((
            Box::new(StringMap::new((**m).clone())),
            map_default(&**m),
        )),
        Slot::Int64Map(m) => Some((
            Box::new(Int64Map::new((**m).clone())),
            map_default(&**m),
        )),
        Slot::Custom(v) => {
            let value = v.flag_value();
            let default = value.to_setting();
            Some((value, default))
        }
        Slot::Nested(_) | Slot::Embedded(_) | Slot::Unsupported(_) => None,
    }
}

fn bind(
    flags: &mut FlagSet,
    settings: &mut Settings,
    names: &Names,
    flag_name: &str,
    value: Box<dyn FlagValue>,
    default: Value,
) -> Result<(), FlagenvError> {
    flags.register(flag_name, names.shorthand, &names.usage, value)?;
    let Some(flag) = flags.lookup(flag_name) else {
        return Err(FlagenvError::UnknownFlag(flag_name.to_string()));
    };

    settings.bind_env(&names.env)?;
    settings.set_default(&names.env, default);
    settings.bind_flag(&names.env, flag)?;
    debug!(flag = flag_name, env = %names.env, "bound field");
    Ok(())
}
