use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ParamError {
    #[error("Please enter a valid value for {field}.")]
    InvalidNumber { field: &'static str },

    #[error("{field} must be greater than zero.")]
    Zero { field: &'static str },

    #[error("Add a postfix to avoid modifying the original photo.")]
    EmptyPostfix,
}

/// A config value as found on disk. Records written by this tool hold strings,
/// hand-edited ones may hold plain numbers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(serde_json::Number),
}

impl FieldValue {
    fn into_text(self) -> String {
        match self {
            FieldValue::Text(text) => text,
            FieldValue::Number(number) => number.to_string(),
        }
    }
}

/// The raw text of the four form fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamFields {
    pub width: String,
    pub height: String,
    pub border: String,
    pub postfix: String,
}

/// On-disk shape of a saved configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfigRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_width: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_height: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_border_size: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postfix: Option<FieldValue>,
}

/// Validated parameters handed to the transformer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorderParams {
    pub width: u32,
    pub height: u32,
    /// Border thickness along the longest side of the source image.
    pub border: u32,
    pub postfix: String,
}

impl ParamFields {
    pub fn new(width: &str, height: &str, border: &str, postfix: &str) -> Self {
        Self {
            width: width.to_string(),
            height: height.to_string(),
            border: border.to_string(),
            postfix: postfix.to_string(),
        }
    }

    pub fn validate(&self) -> Result<BorderParams, ParamError> {
        let width = parse_number(&self.width, "Width")?;
        let height = parse_number(&self.height, "Height")?;
        let border = parse_number(&self.border, "Border size")?;

        if width == 0 {
            return Err(ParamError::Zero { field: "Width" });
        }
        if height == 0 {
            return Err(ParamError::Zero { field: "Height" });
        }
        if self.postfix.is_empty() {
            return Err(ParamError::EmptyPostfix);
        }

        Ok(BorderParams {
            width,
            height,
            border,
            postfix: self.postfix.clone(),
        })
    }

    pub fn to_record(&self) -> ConfigRecord {
        ConfigRecord {
            output_width: Some(FieldValue::Text(self.width.clone())),
            output_height: Some(FieldValue::Text(self.height.clone())),
            height_border_size: Some(FieldValue::Text(self.border.clone())),
            postfix: Some(FieldValue::Text(self.postfix.clone())),
        }
    }

    /// Replace every field with the record's value. Keys missing from the
    /// record leave the field blank.
    pub fn apply_record(&mut self, record: ConfigRecord) {
        let text = |value: Option<FieldValue>| value.map(FieldValue::into_text).unwrap_or_default();

        self.width = text(record.output_width);
        self.height = text(record.output_height);
        self.border = text(record.height_border_size);
        self.postfix = text(record.postfix);
    }
}

fn parse_number(raw: &str, field: &'static str) -> Result<u32, ParamError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| ParamError::InvalidNumber { field })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_well_formed_fields() {
        let fields = ParamFields::new("1200", " 1500 ", "0", "_border");
        let params = fields.validate().unwrap();

        assert_eq!(
            params,
            BorderParams {
                width: 1200,
                height: 1500,
                border: 0,
                postfix: "_border".to_string(),
            }
        );
    }

    #[test]
    fn test_validate_rejects_bad_numbers() {
        let fields = ParamFields::new("12a", "1500", "50", "_b");
        assert_eq!(
            fields.validate(),
            Err(ParamError::InvalidNumber { field: "Width" })
        );

        let fields = ParamFields::new("1200", "", "50", "_b");
        assert_eq!(
            fields.validate(),
            Err(ParamError::InvalidNumber { field: "Height" })
        );

        // Negative borders are not representable
        let fields = ParamFields::new("1200", "1500", "-5", "_b");
        assert_eq!(
            fields.validate(),
            Err(ParamError::InvalidNumber { field: "Border size" })
        );

        let fields = ParamFields::new("0", "1500", "5", "_b");
        assert_eq!(fields.validate(), Err(ParamError::Zero { field: "Width" }));
    }

    #[test]
    fn test_validate_requires_postfix() {
        let fields = ParamFields::new("1200", "1500", "50", "");
        assert_eq!(fields.validate(), Err(ParamError::EmptyPostfix));
    }

    #[test]
    fn test_record_accepts_numbers_and_missing_keys() {
        let record: ConfigRecord =
            serde_json::from_str(r#"{"output_width": 800, "output_height": "1600", "postfix": "_x"}"#)
                .unwrap();

        let mut fields = ParamFields::new("1", "2", "3", "4");
        fields.apply_record(record);

        assert_eq!(fields, ParamFields::new("800", "1600", "", "_x"));
    }

    #[test]
    fn test_record_uses_original_key_names() {
        let fields = ParamFields::new("800", "1600", "40", "_white");
        let json = serde_json::to_value(fields.to_record()).unwrap();

        assert_eq!(json["output_width"], "800");
        assert_eq!(json["output_height"], "1600");
        assert_eq!(json["height_border_size"], "40");
        assert_eq!(json["postfix"], "_white");
    }
}
