//! Where image and document bytes come from.

use serde_json::Value;

use crate::core::open_enum::OpenEnum;
use crate::core::record::Record;
use crate::{api_enum, record, union};

#[api_enum]
pub enum ImageMediaType {
    #[wire(rename = "image/jpeg")]
    Jpeg,
    #[wire(rename = "image/png")]
    Png,
    #[wire(rename = "image/gif")]
    Gif,
    #[wire(rename = "image/webp")]
    Webp,
}

#[record(tag = "base64")]
pub struct Base64ImageSource {
    pub media_type: OpenEnum<ImageMediaType>,
    pub data: String,
}

impl Base64ImageSource {
    pub fn new(media_type: ImageMediaType, data: impl Into<String>) -> Self {
        let mut source = Self::default();
        let record = source.record_mut();
        record.insert_raw("media_type", Value::String(media_type.to_string()));
        record.insert_raw("data", Value::String(data.into()));
        source
    }
}

#[record(tag = "url")]
pub struct UrlImageSource {
    pub url: String,
}

impl UrlImageSource {
    pub fn new(url: impl Into<String>) -> Self {
        let mut source = Self::default();
        source.record_mut().insert_raw("url", Value::String(url.into()));
        source
    }
}

#[union(open)]
pub enum ImageSource {
    #[variant(tag = "base64")]
    Base64(Base64ImageSource),
    #[variant(tag = "url")]
    Url(UrlImageSource),
    #[variant(unknown)]
    Unknown(Value),
}

#[record(tag = "base64")]
pub struct Base64PdfSource {
    /// Always `application/pdf`.
    pub media_type: String,
    pub data: String,
}

impl Base64PdfSource {
    pub fn new(data: impl Into<String>) -> Self {
        let mut source = Self::default();
        let record = source.record_mut();
        record.insert_raw("media_type", Value::String("application/pdf".to_string()));
        record.insert_raw("data", Value::String(data.into()));
        source
    }
}

#[record(tag = "text")]
pub struct PlainTextSource {
    /// Always `text/plain`.
    pub media_type: String,
    pub data: String,
}

impl PlainTextSource {
    pub fn new(data: impl Into<String>) -> Self {
        let mut source = Self::default();
        let record = source.record_mut();
        record.insert_raw("media_type", Value::String("text/plain".to_string()));
        record.insert_raw("data", Value::String(data.into()));
        source
    }
}

#[record(tag = "url")]
pub struct UrlPdfSource {
    pub url: String,
}

#[union(open)]
pub enum DocumentSource {
    #[variant(tag = "base64")]
    Base64(Base64PdfSource),
    #[variant(tag = "text")]
    Text(PlainTextSource),
    #[variant(tag = "url")]
    Url(UrlPdfSource),
    #[variant(unknown)]
    Unknown(Value),
}
