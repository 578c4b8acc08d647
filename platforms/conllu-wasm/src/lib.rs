use conllu_protocol::{ErrorEntry, NoLanguageData, Report};
use conllu_validator::{ValidationConfig, Validator, ValidatorError};
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

/// The structured response sent back to JavaScript
#[derive(Debug, Serialize)]
pub struct ValidationResponse {
    pub valid: bool,
    pub errors: Vec<ErrorEntry>,
    /// Display form of the report, as the command line prints it.
    pub text: String,
    /// Set when the input or the rule archive could not be read at all.
    pub failure: Option<String>,
}

impl ValidationResponse {
    fn from_report(report: Report) -> Self {
        Self {
            valid: report.is_valid(),
            text: report.to_string(),
            errors: report.entries,
            failure: None,
        }
    }

    fn failed(err: ValidatorError) -> Self {
        Self {
            valid: false,
            errors: Vec::new(),
            text: String::new(),
            failure: Some(err.to_string()),
        }
    }
}

/// The validator instance running in the browser
#[wasm_bindgen]
pub struct ConlluEngine {
    // Compiled rule archive (loaded via fetch() in JS); empty means universal rules only
    data: rkyv::AlignedVec,
}

#[wasm_bindgen]
impl ConlluEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(data: Vec<u8>) -> Self {
        let mut aligned = rkyv::AlignedVec::with_capacity(data.len());
        aligned.extend_from_slice(&data);
        Self { data: aligned }
    }

    /// CoNLL-U text + options (a `ValidationConfig` object, or undefined) -> report object
    pub fn validate(&self, input: &str, options: JsValue) -> Result<JsValue, JsValue> {
        let config: ValidationConfig = if options.is_undefined() || options.is_null() {
            ValidationConfig::default()
        } else {
            serde_wasm_bindgen::from_value(options)?
        };
        let response = self.run(input, config);
        Ok(serde_wasm_bindgen::to_value(&response)?)
    }
}

impl ConlluEngine {
    fn run(&self, input: &str, config: ValidationConfig) -> ValidationResponse {
        let validator = if self.data.is_empty() {
            Ok(Validator::new(config, NoLanguageData))
        } else {
            Validator::from_archive(config, &self.data)
        };
        let result = validator.and_then(|mut validator| {
            validator.validate_str(input)?;
            Ok(validator.finish(None))
        });
        match result {
            Ok(report) => ValidationResponse::from_report(report),
            Err(err) => ValidationResponse::failed(err),
        }
    }
}
