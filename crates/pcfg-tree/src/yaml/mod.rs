//! YAML text codec
//!
//! Everything goes through a reader that records styles, comments and
//! layout. Text it cannot model is never parsed lossily: invalid YAML gives
//! [`TreeError::Yaml`], valid YAML outside the subset gives
//! [`TreeError::Unsupported`].

mod reader;
mod writer;

use crate::document::Document;
use crate::error::{TreeError, TreeResult};

pub(crate) fn parse(text: &str) -> TreeResult<Document> {
    reader::read(text).map_err(|err| {
        // serde_yaml only decides which of the two errors to report.
        match serde_yaml::from_str::<serde_yaml::Value>(text) {
            Err(invalid) => TreeError::Yaml(invalid),
            Ok(_) => match err {
                TreeError::Syntax { line, message } => TreeError::unsupported(line, message),
                other => other,
            },
        }
    })
}

pub(crate) fn emit(doc: &Document) -> String {
    writer::write(doc)
}
