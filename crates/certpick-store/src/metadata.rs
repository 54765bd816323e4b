use sha1::{
    Digest,
    Sha1,
};
use time::OffsetDateTime;
use x509_parser::parse_x509_certificate;
use x509_parser::x509::{
    AttributeTypeAndValue,
    X509Name,
};

use crate::error::StoreError;

const ATTRIBUTE_SHORT_NAMES: &[(&str, &str)] = &[
    ("2.5.4.3", "CN"),
    ("2.5.4.4", "SN"),
    ("2.5.4.5", "SERIALNUMBER"),
    ("2.5.4.6", "C"),
    ("2.5.4.7", "L"),
    ("2.5.4.8", "S"),
    ("2.5.4.9", "STREET"),
    ("2.5.4.10", "O"),
    ("2.5.4.11", "OU"),
    ("2.5.4.12", "T"),
    ("2.5.4.42", "G"),
    ("1.2.840.113549.1.9.1", "E"),
    ("0.9.2342.19200300.100.1.25", "DC"),
    ("0.9.2342.19200300.100.1.1", "UID"),
];

/// Fields the selector reads from a certificate, parsed once per entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateMetadata {
    /// Subject DN, most specific attribute first: `CN=example.com, O=Example, C=US`.
    pub subject: String,
    pub issuer: String,
    pub serial_number: String,
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
    /// Upper-case hex SHA-1 of the DER encoding.
    pub thumbprint: String,
}

impl CertificateMetadata {
    pub fn from_der(der: &[u8]) -> Result<Self, StoreError> {
        let (_, certificate) = parse_x509_certificate(der)
            .map_err(|e| StoreError::InvalidCertificate(e.to_string()))?;

        let validity = certificate.validity();

        Ok(Self {
            subject: render_name(certificate.subject()),
            issuer: render_name(certificate.issuer()),
            serial_number: certificate.raw_serial_as_string(),
            not_before: validity.not_before.to_datetime(),
            not_after: validity.not_after.to_datetime(),
            thumbprint: thumbprint(der),
        })
    }

    pub fn is_time_valid(&self, at: OffsetDateTime) -> bool {
        self.not_before <= at && at <= self.not_after
    }
}

pub fn thumbprint(der: &[u8]) -> String {
    Sha1::digest(der)
        .iter()
        .map(|byte| format!("{byte:02X}"))
        .collect()
}

fn render_name(name: &X509Name<'_>) -> String {
    let rdns: Vec<String> = name
        .iter_rdn()
        .map(|rdn| {
            rdn.iter()
                .map(render_attribute)
                .collect::<Vec<_>>()
                .join("+")
        })
        .collect();

    rdns.into_iter().rev().collect::<Vec<_>>().join(", ")
}

fn render_attribute(attribute: &AttributeTypeAndValue<'_>) -> String {
    let oid = attribute.attr_type().to_id_string();
    let key = ATTRIBUTE_SHORT_NAMES
        .iter()
        .find(|(known, _)| *known == oid)
        .map(|(_, short)| short.to_string())
        .unwrap_or_else(|| format!("OID.{oid}"));

    match decode_value(attribute) {
        Some(value) => format!("{}={}", key, quote_value(&value)),
        None => format!("{}=#{}", key, hex_value(attribute)),
    }
}

// Universal tags of the string types read beyond what `as_str` accepts.
const TAG_TELETEX_STRING: u32 = 20;
const TAG_VISIBLE_STRING: u32 = 26;
const TAG_UNIVERSAL_STRING: u32 = 28;
const TAG_BMP_STRING: u32 = 30;

fn decode_value(attribute: &AttributeTypeAndValue<'_>) -> Option<String> {
    let value = attribute.attr_value();
    let data = value.data;

    match value.header.tag().0 {
        TAG_BMP_STRING => {
            if data.len() % 2 != 0 {
                return None;
            }
            let units = data
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
            char::decode_utf16(units).collect::<Result<String, _>>().ok()
        }
        TAG_UNIVERSAL_STRING => {
            if data.len() % 4 != 0 {
                return None;
            }
            data.chunks_exact(4)
                .map(|quad| char::from_u32(u32::from_be_bytes([quad[0], quad[1], quad[2], quad[3]])))
                .collect()
        }
        TAG_TELETEX_STRING => Some(data.iter().map(|&byte| char::from(byte)).collect()),
        TAG_VISIBLE_STRING => std::str::from_utf8(data).ok().map(str::to_string),
        _ => attribute.as_str().ok().map(str::to_string),
    }
}

/// Wraps values that would otherwise read as DN syntax in double quotes,
/// doubling any embedded quote.
fn quote_value(value: &str) -> String {
    let needs_quotes = value.starts_with(char::is_whitespace)
        || value.ends_with(char::is_whitespace)
        || value
            .chars()
            .any(|c| matches!(c, ',' | '+' | '=' | '"' | '\\' | '<' | '>' | ';' | '#' | '\n' | '\r'));

    if needs_quotes {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Upper-case hex of the value's DER encoding, for values with no text form.
fn hex_value(attribute: &AttributeTypeAndValue<'_>) -> String {
    let value = attribute.attr_value();
    let tag = (value.header.tag().0 & 0x1f) as u8;
    let constructed = if value.header.is_constructed() { 0x20 } else { 0 };

    let mut der = vec![tag | constructed];
    let length = value.data.len();
    if length < 0x80 {
        der.push(length as u8);
    } else {
        let bytes = length.to_be_bytes();
        let skip = bytes.iter().take_while(|&&b| b == 0).count();
        der.push(0x80 | (bytes.len() - skip) as u8);
        der.extend_from_slice(&bytes[skip..]);
    }
    der.extend_from_slice(value.data);

    der.iter().map(|byte| format!("{byte:02X}")).collect()
}
