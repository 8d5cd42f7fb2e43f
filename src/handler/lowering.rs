//! Lowering of handler return values into `serde_json::Value`.
//!
//! `serde_json::to_value` maps `NaN` and infinities to `null`. Values are
//! first walked with [`FiniteFloats`], which fails on any non-finite float so
//! the loss surfaces as an encoding error instead.

use serde::ser::{self, Error as _, Serialize};
use serde_json::Value;

pub(crate) fn lower<T: Serialize + ?Sized>(value: &T) -> Result<Value, serde_json::Error> {
    value.serialize(FiniteFloats)?;
    serde_json::to_value(value)
}

/// Serializer that produces nothing and rejects non-finite floats.
struct FiniteFloats;

type Outcome = Result<(), serde_json::Error>;

fn check_float(v: f64) -> Outcome {
    if v.is_finite() {
        Ok(())
    } else {
        Err(serde_json::Error::custom(format_args!(
            "non-finite float {v} has no JSON representation"
        )))
    }
}

impl ser::Serializer for FiniteFloats {
    type Ok = ();
    type Error = serde_json::Error;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    fn serialize_bool(self, _: bool) -> Outcome {
        Ok(())
    }
    fn serialize_i8(self, _: i8) -> Outcome {
        Ok(())
    }
    fn serialize_i16(self, _: i16) -> Outcome {
        Ok(())
    }
    fn serialize_i32(self, _: i32) -> Outcome {
        Ok(())
    }
    fn serialize_i64(self, _: i64) -> Outcome {
        Ok(())
    }
    fn serialize_i128(self, _: i128) -> Outcome {
        Ok(())
    }
    fn serialize_u8(self, _: u8) -> Outcome {
        Ok(())
    }
    fn serialize_u16(self, _: u16) -> Outcome {
        Ok(())
    }
    fn serialize_u32(self, _: u32) -> Outcome {
        Ok(())
    }
    fn serialize_u64(self, _: u64) -> Outcome {
        Ok(())
    }
    fn serialize_u128(self, _: u128) -> Outcome {
        Ok(())
    }
    fn serialize_f32(self, v: f32) -> Outcome {
        check_float(f64::from(v))
    }
    fn serialize_f64(self, v: f64) -> Outcome {
        check_float(v)
    }
    fn serialize_char(self, _: char) -> Outcome {
        Ok(())
    }
    fn serialize_str(self, _: &str) -> Outcome {
        Ok(())
    }
    fn serialize_bytes(self, _: &[u8]) -> Outcome {
        Ok(())
    }
    fn serialize_none(self) -> Outcome {
        Ok(())
    }
    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Outcome {
        value.serialize(self)
    }
    fn serialize_unit(self) -> Outcome {
        Ok(())
    }
    fn serialize_unit_struct(self, _: &'static str) -> Outcome {
        Ok(())
    }
    fn serialize_unit_variant(self, _: &'static str, _: u32, _: &'static str) -> Outcome {
        Ok(())
    }
    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _: &'static str,
        value: &T,
    ) -> Outcome {
        value.serialize(self)
    }
    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        value: &T,
    ) -> Outcome {
        value.serialize(self)
    }
    fn serialize_seq(self, _: Option<usize>) -> Result<Self, serde_json::Error> {
        Ok(self)
    }
    fn serialize_tuple(self, _: usize) -> Result<Self, serde_json::Error> {
        Ok(self)
    }
    fn serialize_tuple_struct(
        self,
        _: &'static str,
        _: usize,
    ) -> Result<Self, serde_json::Error> {
        Ok(self)
    }
    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self, serde_json::Error> {
        Ok(self)
    }
    fn serialize_map(self, _: Option<usize>) -> Result<Self, serde_json::Error> {
        Ok(self)
    }
    fn serialize_struct(self, _: &'static str, _: usize) -> Result<Self, serde_json::Error> {
        Ok(self)
    }
    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self, serde_json::Error> {
        Ok(self)
    }
}

impl ser::SerializeSeq for FiniteFloats {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Outcome {
        value.serialize(FiniteFloats)
    }
    fn end(self) -> Outcome {
        Ok(())
    }
}

impl ser::SerializeTuple for FiniteFloats {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Outcome {
        value.serialize(FiniteFloats)
    }
    fn end(self) -> Outcome {
        Ok(())
    }
}

impl ser::SerializeTupleStruct for FiniteFloats {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Outcome {
        value.serialize(FiniteFloats)
    }
    fn end(self) -> Outcome {
        Ok(())
    }
}

impl ser::SerializeTupleVariant for FiniteFloats {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Outcome {
        value.serialize(FiniteFloats)
    }
    fn end(self) -> Outcome {
        Ok(())
    }
}

impl ser::SerializeMap for FiniteFloats {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Outcome {
        key.serialize(FiniteFloats)
    }
    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Outcome {
        value.serialize(FiniteFloats)
    }
    fn end(self) -> Outcome {
        Ok(())
    }
}

impl ser::SerializeStruct for FiniteFloats {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, _: &'static str, value: &T) -> Outcome {
        value.serialize(FiniteFloats)
    }
    fn end(self) -> Outcome {
        Ok(())
    }
}

impl ser::SerializeStructVariant for FiniteFloats {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, _: &'static str, value: &T) -> Outcome {
        value.serialize(FiniteFloats)
    }
    fn end(self) -> Outcome {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn test_finite_values_lower_unchanged() {
        let value = lower(&(1.5_f64, -0.0_f32, "x", Some(3_u8))).unwrap();
        assert_eq!(value, json!([1.5, -0.0, "x", 3]));
    }

    #[test]
    fn test_nested_non_finite_is_rejected() {
        let mut inner = BTreeMap::new();
        inner.insert("ratio", vec![1.0, f64::NEG_INFINITY]);
        let err = lower(&Some(inner)).unwrap_err();
        assert!(err.to_string().contains("non-finite float -inf"));
    }

    #[test]
    fn test_nan_f32_is_rejected() {
        assert!(lower(&f32::NAN).is_err());
    }
}
