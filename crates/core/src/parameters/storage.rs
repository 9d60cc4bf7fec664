//! Parameter Storage Types
//!
//! Named, typed tunables for the pack controller. A parameter is registered
//! once with its default; later writes must keep the registered type. Values
//! live in a fixed-capacity heapless map so the store needs no allocator.

use super::error::ParameterError;
use heapless::index_map::FnvIndexMap;
use heapless::String;

/// Longest parameter name
pub const PARAM_NAME_LEN: usize = 16;

/// Store capacity (must be a power of two)
pub const MAX_PARAMS: usize = 32;

/// Parameter name as stored
pub type ParamName = String<PARAM_NAME_LEN>;

/// Value of a registered parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    /// Counts and durations
    Int(i32),
    /// Limits, levels and step sizes
    Float(f64),
}

impl ParamValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            ParamValue::Int(v) => v as f64,
            ParamValue::Float(v) => v,
        }
    }

    fn same_kind(&self, other: &ParamValue) -> bool {
        core::mem::discriminant(self) == core::mem::discriminant(other)
    }

    /// Parse `text` into a value of the same kind as `self`
    ///
    /// Integer parameters reject fractional text rather than truncating it.
    pub fn parse_like(&self, text: &str) -> Result<ParamValue, ParameterError> {
        let text = text.trim();
        match self {
            ParamValue::Int(_) => text
                .parse::<i32>()
                .map(ParamValue::Int)
                .map_err(|_| ParameterError::TypeMismatch),
            ParamValue::Float(_) => text
                .parse::<f64>()
                .map(ParamValue::Float)
                .map_err(|_| ParameterError::TypeMismatch),
        }
    }
}

/// Registered pack parameters, in registration order
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    values: FnvIndexMap<ParamName, ParamValue, MAX_PARAMS>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(name: &str) -> Result<ParamName, ParameterError> {
        let mut key = ParamName::new();
        key.push_str(name)
            .map_err(|_| ParameterError::InvalidConfig)?;
        Ok(key)
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        let key = Self::key(name).ok()?;
        self.values.get(&key)
    }

    /// Numeric value of `name`, or `default` when it is not registered
    pub fn get_f64_or(&self, name: &str, default: f64) -> f64 {
        self.get(name).map(ParamValue::as_f64).unwrap_or(default)
    }

    /// Overwrite a registered parameter, keeping its kind
    pub fn set(&mut self, name: &str, value: ParamValue) -> Result<(), ParameterError> {
        let key = Self::key(name).map_err(|_| ParameterError::UnknownName)?;
        let slot = self
            .values
            .get_mut(&key)
            .ok_or(ParameterError::UnknownName)?;
        if !slot.same_kind(&value) {
            return Err(ParameterError::TypeMismatch);
        }
        *slot = value;
        Ok(())
    }

    /// Parse `text` as the registered kind of `name` and store it
    pub fn set_parsed(&mut self, name: &str, text: &str) -> Result<(), ParameterError> {
        let value = self
            .get(name)
            .ok_or(ParameterError::UnknownName)?
            .parse_like(text)?;
        self.set(name, value)
    }

    /// Add `name` with its default
    ///
    /// Registering an existing name keeps the current value.
    pub fn register(
        &mut self,
        name: &str,
        default_value: ParamValue,
    ) -> Result<(), ParameterError> {
        let key = Self::key(name)?;
        if self.values.contains_key(&key) {
            return Ok(());
        }
        self.values
            .insert(key, default_value)
            .map_err(|_| ParameterError::StoreFull)?;
        Ok(())
    }

    /// Name and value of every parameter, in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_get() {
        let mut store = ParameterStore::new();
        assert!(store.is_empty());

        store.register("STOR_SOC", ParamValue::Float(50.0)).unwrap();
        assert_eq!(store.get("STOR_SOC"), Some(&ParamValue::Float(50.0)));
        assert!((store.get_f64_or("STOR_SOC", 0.0) - 50.0).abs() < f64::EPSILON);
        assert!((store.get_f64_or("MISSING", 7.5) - 7.5).abs() < f64::EPSILON);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_set_keeps_kind() {
        let mut store = ParameterStore::new();
        store.register("FLT_UV", ParamValue::Float(2.7)).unwrap();

        store.set("FLT_UV", ParamValue::Float(2.8)).unwrap();
        assert_eq!(store.get("FLT_UV"), Some(&ParamValue::Float(2.8)));
        assert_eq!(
            store.set("FLT_UV", ParamValue::Int(3)),
            Err(ParameterError::TypeMismatch)
        );
        assert_eq!(store.get("FLT_UV"), Some(&ParamValue::Float(2.8)));
    }

    #[test]
    fn test_set_unregistered_name() {
        let mut store = ParameterStore::new();
        assert_eq!(
            store.set("FLT_UV", ParamValue::Float(2.8)),
            Err(ParameterError::UnknownName)
        );
        assert_eq!(
            store.set("A_NAME_FAR_TOO_LONG", ParamValue::Int(1)),
            Err(ParameterError::UnknownName)
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_register_rejects_long_name() {
        let mut store = ParameterStore::new();
        assert_eq!(
            store.register("A_NAME_FAR_TOO_LONG", ParamValue::Int(1)),
            Err(ParameterError::InvalidConfig)
        );
    }

    #[test]
    fn test_register_twice_keeps_value() {
        let mut store = ParameterStore::new();
        store.register("HOLD_MS", ParamValue::Int(5000)).unwrap();
        store.set("HOLD_MS", ParamValue::Int(3000)).unwrap();

        store.register("HOLD_MS", ParamValue::Int(5000)).unwrap();
        assert_eq!(store.get("HOLD_MS"), Some(&ParamValue::Int(3000)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_full() {
        let mut store = ParameterStore::new();
        let mut name = ParamName::new();
        for i in 0..MAX_PARAMS {
            name.clear();
            core::fmt::Write::write_fmt(&mut name, format_args!("P{i}")).unwrap();
            store.register(&name, ParamValue::Int(0)).unwrap();
        }
        assert_eq!(
            store.register("ONE_MORE", ParamValue::Int(0)),
            Err(ParameterError::StoreFull)
        );
    }

    #[test]
    fn test_set_parsed() {
        let mut store = ParameterStore::new();
        store.register("FLT_TCOLD", ParamValue::Float(2.32)).unwrap();
        store.register("HOLD_MS", ParamValue::Int(5000)).unwrap();

        store.set_parsed("FLT_TCOLD", " 2.30 ").unwrap();
        store.set_parsed("HOLD_MS", "4000").unwrap();
        assert_eq!(store.get("FLT_TCOLD"), Some(&ParamValue::Float(2.30)));
        assert_eq!(store.get("HOLD_MS"), Some(&ParamValue::Int(4000)));

        assert_eq!(
            store.set_parsed("HOLD_MS", "4.5"),
            Err(ParameterError::TypeMismatch)
        );
        assert_eq!(
            store.set_parsed("FLT_TCOLD", "cold"),
            Err(ParameterError::TypeMismatch)
        );
        assert_eq!(
            store.set_parsed("NOPE", "1"),
            Err(ParameterError::UnknownName)
        );
    }

    #[test]
    fn test_iter_in_registration_order() {
        let mut store = ParameterStore::new();
        store.register("B", ParamValue::Int(2)).unwrap();
        store.register("A", ParamValue::Float(1.0)).unwrap();

        let mut it = store.iter();
        assert_eq!(it.next(), Some(("B", &ParamValue::Int(2))));
        assert_eq!(it.next(), Some(("A", &ParamValue::Float(1.0))));
        assert_eq!(it.next(), None);
    }
}
