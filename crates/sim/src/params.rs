//! Parameter overrides from the command line.

use pack_bms_core::parameters::{PackParams, ParameterStore};

use crate::error::SimError;

/// Store holding every pack parameter at its default.
pub fn default_store() -> Result<ParameterStore, SimError> {
    let mut store = ParameterStore::new();
    PackParams::register_defaults(&mut store)?;
    Ok(store)
}

/// Defaults with `NAME=VALUE` overrides applied, validated.
pub fn load_params<S: AsRef<str>>(overrides: &[S]) -> Result<PackParams, SimError> {
    let mut store = default_store()?;

    for entry in overrides {
        let entry = entry.as_ref();
        let (name, value) = entry
            .split_once('=')
            .ok_or_else(|| SimError::BadParam(entry.to_string()))?;
        store
            .set_parsed(name.trim(), value)
            .map_err(|source| SimError::Override {
                name: name.trim().to_string(),
                source,
            })?;
    }

    let params = PackParams::from_store(&store);
    params.validate()?;
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pack_bms_core::parameters::ParameterError;

    #[test]
    fn test_no_overrides_gives_defaults() {
        let params = load_params::<&str>(&[]).unwrap();
        assert_eq!(params, PackParams::default());
    }

    #[test]
    fn test_overrides_applied() {
        let params = load_params(&["STOR_SOC=70", " HOLD_MS =3000", "FATAL_UV=2.4"]).unwrap();
        assert!((params.storage_soc_target - 70.0).abs() < 1e-12);
        assert_eq!(params.hold_ms, 3000);
        assert!((params.fatal.undervoltage - 2.4).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_name_is_reported() {
        assert!(matches!(
            load_params(&["FLT_WARP=1"]),
            Err(SimError::Override {
                name,
                source: ParameterError::UnknownName,
            }) if name == "FLT_WARP"
        ));
    }

    #[test]
    fn test_bad_value_is_reported() {
        assert!(matches!(
            load_params(&["HOLD_MS=2.5"]),
            Err(SimError::Override { source: ParameterError::TypeMismatch, .. })
        ));
        assert!(matches!(
            load_params(&["STOR_SOC"]),
            Err(SimError::BadParam(entry)) if entry == "STOR_SOC"
        ));
    }

    #[test]
    fn test_overrides_are_validated() {
        assert!(matches!(
            load_params(&["FATAL_UV=2.9"]),
            Err(SimError::Parameter(ParameterError::InconsistentLimits))
        ));
    }
}
