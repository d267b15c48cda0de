use crate::{
    data_type::{DataType, Kind},
    shape::{TensorDescriptor, TensorShape},
};

use serde::ser::SerializeStruct;
use serde::Deserialize;

impl serde::Serialize for DataType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("DataType", 2)?;
        state.serialize_field("kind", &self.kind())?;
        state.serialize_field("complex", &self.is_complex())?;
        state.end()
    }
}

impl<'de> serde::Deserialize<'de> for DataType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct DataTypeData {
            kind: Kind,
            complex: bool,
        }

        let DataTypeData { kind, complex } = DataTypeData::deserialize(deserializer)?;
        DataType::new(kind, complex).map_err(serde::de::Error::custom)
    }
}

impl serde::Serialize for TensorDescriptor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("TensorDescriptor", 3)?;
        state.serialize_field("shape", &self.shape())?;
        state.serialize_field("rows", &self.rows())?;
        state.serialize_field("cols", &self.cols())?;
        state.end()
    }
}

impl<'de> serde::Deserialize<'de> for TensorDescriptor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct TensorData {
            shape: TensorShape,
            rows: usize,
            cols: usize,
        }

        let TensorData { shape, rows, cols } = TensorData::deserialize(deserializer)?;
        TensorDescriptor::new(shape, rows, cols).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_descriptor() -> Result<(), Box<dyn std::error::Error>> {
        let tensor = TensorDescriptor::new(TensorShape::Symmetric, 3, 3)?;
        let serialized = serde_json::to_string(&tensor)?;
        let deserialized: TensorDescriptor = serde_json::from_str(&serialized)?;
        assert_eq!(tensor, deserialized);
        assert_eq!(deserialized.elements(), 6);
        Ok(())
    }

    #[test]
    fn test_serde_rejects_inconsistent() {
        let bad = r#"{"shape":"Symmetric","rows":2,"cols":3}"#;
        assert!(serde_json::from_str::<TensorDescriptor>(bad).is_err());

        let bad = r#"{"kind":"UInt8","complex":true}"#;
        assert!(serde_json::from_str::<DataType>(bad).is_err());
    }

    #[test]
    fn test_serde_data_type() -> Result<(), Box<dyn std::error::Error>> {
        let dt = DataType::complex(Kind::Float64)?;
        let deserialized: DataType = serde_json::from_str(&serde_json::to_string(&dt)?)?;
        assert_eq!(dt, deserialized);
        Ok(())
    }
}
