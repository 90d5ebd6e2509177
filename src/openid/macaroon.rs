//! Decoding of the discharge macaroons returned by the macaroon OpenID extension.
//!
//! Both binary serialization formats are understood: version 2 (a `0x02` byte followed by
//! `type, length, data` fields) and the older version 1 packet format (`XXXX key value\n`, where
//! `XXXX` is the hex length of the packet).

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;

use super::error::MacaroonError;

/// Length of a macaroon signature (a HMAC-SHA256 digest).
const SIGNATURE_LENGTH: usize = 32;

const V2_VERSION: u8 = 2;

const FIELD_EOS: u64 = 0;
const FIELD_LOCATION: u64 = 1;
const FIELD_IDENTIFIER: u64 = 2;
const FIELD_VID: u64 = 4;
const FIELD_SIGNATURE: u64 = 6;

/// A caveat of a macaroon. Third party caveats carry a verification id and usually a location.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Caveat {
    pub identifier: Vec<u8>,
    pub verification_id: Option<Vec<u8>>,
    pub location: Option<String>,
}

impl Caveat {
    pub fn is_third_party(&self) -> bool {
        self.verification_id.is_some()
    }
}

/// A discharge macaroon issued by Ubuntu SSO for a third party caveat.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Discharge {
    pub location: String,
    pub identifier: Vec<u8>,
    pub caveats: Vec<Caveat>,
    pub signature: [u8; SIGNATURE_LENGTH],
}

impl Discharge {
    /// Decode a base64 encoded macaroon. Standard and URL-safe alphabets are accepted, with or
    /// without padding.
    pub fn from_base64(encoded: &str) -> Result<Discharge, MacaroonError> {
        let trimmed = encoded.trim().trim_end_matches('=');

        let data = if trimmed.contains(|c: char| c == '-' || c == '_') {
            URL_SAFE_NO_PAD.decode(trimmed)?
        } else {
            STANDARD_NO_PAD.decode(trimmed)?
        };

        Discharge::from_binary(&data)
    }

    /// Decode a macaroon in either binary format.
    pub fn from_binary(data: &[u8]) -> Result<Discharge, MacaroonError> {
        match data.first() {
            None => Err(MacaroonError::Truncated),
            Some(&V2_VERSION) => from_binary_v2(&data[1..]),
            Some(_) => from_binary_v1(data),
        }
    }
}

fn signature_from(bytes: &[u8]) -> Result<[u8; SIGNATURE_LENGTH], MacaroonError> {
    bytes
        .try_into()
        .map_err(|_| MacaroonError::InvalidSignature { length: bytes.len() })
}

fn location_from(bytes: &[u8]) -> Result<String, MacaroonError> {
    String::from_utf8(bytes.to_vec()).map_err(|_| MacaroonError::InvalidLocation)
}

/// Reads `type, length, data` fields of the version 2 format.
struct FieldReader<'a> {
    data: &'a [u8],
}

impl<'a> FieldReader<'a> {
    fn uvarint(&mut self) -> Result<u64, MacaroonError> {
        let data = self.data;
        let mut value: u64 = 0;

        for (index, byte) in data.iter().enumerate().take(10) {
            value |= u64::from(byte & 0x7f) << (7 * index);
            if byte & 0x80 == 0 {
                self.data = &data[index + 1..];
                return Ok(value);
            }
        }

        Err(MacaroonError::Truncated)
    }

    /// Returns the next field; the end-of-section marker has no length or data.
    fn next(&mut self) -> Result<(u64, &'a [u8]), MacaroonError> {
        let kind = self.uvarint()?;
        if kind == FIELD_EOS {
            let empty: &'a [u8] = &[];
            return Ok((FIELD_EOS, empty));
        }

        let length = usize::try_from(self.uvarint()?).map_err(|_| MacaroonError::Truncated)?;
        if length > self.data.len() {
            return Err(MacaroonError::Truncated);
        }

        let (field, rest) = self.data.split_at(length);
        self.data = rest;
        Ok((kind, field))
    }

    fn expect(&mut self, kind: u64) -> Result<&'a [u8], MacaroonError> {
        match self.next()? {
            (found, data) if found == kind => Ok(data),
            (found, _) => Err(MacaroonError::UnexpectedField {
                field: found.to_string(),
            }),
        }
    }
}

fn from_binary_v2(data: &[u8]) -> Result<Discharge, MacaroonError> {
    let mut reader = FieldReader { data };

    let mut field = reader.next()?;
    let mut location = String::new();
    if field.0 == FIELD_LOCATION {
        location = location_from(field.1)?;
        field = reader.next()?;
    }

    let identifier = match field {
        (FIELD_IDENTIFIER, data) => data.to_vec(),
        _ => return Err(MacaroonError::MissingField { field: "identifier" }),
    };
    reader.expect(FIELD_EOS)?;

    let mut caveats = Vec::new();
    loop {
        let mut field = reader.next()?;
        if field.0 == FIELD_EOS {
            break;
        }

        let mut caveat = Caveat::default();
        if field.0 == FIELD_LOCATION {
            caveat.location = Some(location_from(field.1)?);
            field = reader.next()?;
        }

        caveat.identifier = match field {
            (FIELD_IDENTIFIER, data) => data.to_vec(),
            _ => return Err(MacaroonError::MissingField { field: "caveat identifier" }),
        };

        match reader.next()? {
            (FIELD_EOS, _) => {},
            (FIELD_VID, data) => {
                caveat.verification_id = Some(data.to_vec());
                reader.expect(FIELD_EOS)?;
            },
            (found, _) => {
                return Err(MacaroonError::UnexpectedField {
                    field: found.to_string(),
                })
            },
        }

        caveats.push(caveat);
    }

    let signature = signature_from(reader.expect(FIELD_SIGNATURE)?)?;

    Ok(Discharge {
        location,
        identifier,
        caveats,
        signature,
    })
}

/// Splits version 1 data into `(key, value)` packets.
fn packets_v1(mut data: &[u8]) -> Result<Vec<(&str, &[u8])>, MacaroonError> {
    let mut packets = Vec::new();

    while !data.is_empty() {
        let header = data.get(..4).ok_or(MacaroonError::Truncated)?;
        let length = std::str::from_utf8(header)
            .ok()
            .and_then(|hex| usize::from_str_radix(hex, 16).ok())
            .ok_or_else(|| MacaroonError::UnexpectedField {
                field: String::from_utf8_lossy(header).into_owned(),
            })?;

        if length <= 4 || length > data.len() {
            return Err(MacaroonError::Truncated);
        }

        let body = data[4..length]
            .strip_suffix(b"\n")
            .ok_or(MacaroonError::Truncated)?;
        let separator = body
            .iter()
            .position(|byte| *byte == b' ')
            .ok_or(MacaroonError::Truncated)?;
        let key = std::str::from_utf8(&body[..separator]).map_err(|_| MacaroonError::UnexpectedField {
            field: String::from_utf8_lossy(&body[..separator]).into_owned(),
        })?;

        packets.push((key, &body[separator + 1..]));
        data = &data[length..];
    }

    Ok(packets)
}

fn from_binary_v1(data: &[u8]) -> Result<Discharge, MacaroonError> {
    let mut packets = packets_v1(data)?.into_iter();

    let location = match packets.next() {
        Some(("location", value)) => location_from(value)?,
        _ => return Err(MacaroonError::MissingField { field: "location" }),
    };

    let identifier = match packets.next() {
        Some(("identifier", value)) => value.to_vec(),
        _ => return Err(MacaroonError::MissingField { field: "identifier" }),
    };

    let mut caveats: Vec<Caveat> = Vec::new();
    for (key, value) in packets {
        match key {
            "cid" => caveats.push(Caveat {
                identifier: value.to_vec(),
                ..Caveat::default()
            }),
            "vid" | "cl" => {
                let caveat = caveats
                    .last_mut()
                    .ok_or_else(|| MacaroonError::UnexpectedField { field: key.to_string() })?;

                if key == "vid" {
                    caveat.verification_id = Some(value.to_vec());
                } else {
                    caveat.location = Some(location_from(value)?);
                }
            },
            "signature" => {
                return Ok(Discharge {
                    location,
                    identifier,
                    caveats,
                    signature: signature_from(value)?,
                })
            },
            _ => return Err(MacaroonError::UnexpectedField { field: key.to_string() }),
        }
    }

    Err(MacaroonError::MissingField { field: "signature" })
}


#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::{STANDARD, URL_SAFE};

    use super::test_helpers::{macaroon_v1, macaroon_v2, SIGNATURE};
    use super::*;

    fn check(discharge: &Discharge) {
        assert_eq!(discharge.location, "https://login.ubuntu.com");
        assert_eq!(discharge.identifier, b"discharge-id");
        assert_eq!(discharge.signature, SIGNATURE);
        assert_eq!(discharge.caveats.len(), 2);

        assert_eq!(discharge.caveats[0].identifier, b"time-before 2030-01-01T00:00:00Z");
        assert!(!discharge.caveats[0].is_third_party());
        assert_eq!(discharge.caveats[0].location, None);

        assert_eq!(discharge.caveats[1].identifier, b"third-party-id");
        assert!(discharge.caveats[1].is_third_party());
        assert_eq!(discharge.caveats[1].verification_id.as_deref(), Some(&b"vid"[..]));
        assert_eq!(discharge.caveats[1].location.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn test_decode_v2() {
        check(&Discharge::from_binary(&macaroon_v2()).unwrap());
    }

    #[test]
    fn test_decode_v1() {
        check(&Discharge::from_binary(&macaroon_v1()).unwrap());
    }

    #[test]
    fn test_decode_base64_variants() {
        let data = macaroon_v2();

        check(&Discharge::from_base64(&STANDARD.encode(&data)).unwrap());
        check(&Discharge::from_base64(&URL_SAFE.encode(&data)).unwrap());
        check(&Discharge::from_base64(&URL_SAFE_NO_PAD.encode(&data)).unwrap());
    }

    #[test]
    fn test_decode_invalid_base64() {
        assert!(matches!(
            Discharge::from_base64("not base64!"),
            Err(MacaroonError::Base64 { .. })
        ));
    }

    #[test]
    fn test_decode_empty() {
        assert_eq!(Discharge::from_binary(&[]), Err(MacaroonError::Truncated));
    }

    #[test]
    fn test_decode_truncated_v2() {
        let data = macaroon_v2();
        assert!(Discharge::from_binary(&data[..data.len() - 5]).is_err());
    }

    #[test]
    fn test_decode_truncated_v1() {
        let data = macaroon_v1();
        assert!(Discharge::from_binary(&data[..data.len() - 10]).is_err());
    }

    #[test]
    fn test_decode_short_signature() {
        let mut data = macaroon_v2();
        let length = data.len();
        data.truncate(length - SIGNATURE.len() - 2);
        data.extend_from_slice(&[6, 3, 1, 2, 3]);

        assert_eq!(
            Discharge::from_binary(&data),
            Err(MacaroonError::InvalidSignature { length: 3 })
        );
    }

    #[test]
    fn test_decode_garbage() {
        assert!(Discharge::from_binary(b"zzzz garbage\n").is_err());
    }
}
