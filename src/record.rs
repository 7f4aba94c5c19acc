use std::fmt;

use crate::bytes::{read_i32, write_i32, ByteLength, FromBytes, IntoBytes};
use crate::consts::*;
use crate::error::HashFileError;

const NAME_OFFSET: usize = INT_SIZE;
const SURNAME_OFFSET: usize = NAME_OFFSET + NAME_LEN;
const CITY_OFFSET: usize = SURNAME_OFFSET + SURNAME_LEN;

/// The record stored in a hash file
///
/// ## Binary layout
///
/// - 4 bytes id, little endian
/// - 15 bytes name, 20 bytes surname, 20 bytes city, each NUL padded
/// - 1 byte of padding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    id: i32,
    name: String,
    surname: String,
    city: String,
}

fn check_field(field: &'static str, value: &str, max: usize) -> Result<(), HashFileError> {
    if value.len() > max {
        return Err(HashFileError::RecordField {
            field,
            reason: format!("{} bytes, at most {} fit", value.len(), max),
        });
    }
    if value.contains('\0') {
        return Err(HashFileError::RecordField {
            field,
            reason: "contains a NUL byte".to_string(),
        });
    }
    Ok(())
}

fn write_text(buf: &mut [u8], offset: usize, len: usize, value: &str) {
    let field = &mut buf[offset..offset + len];
    field.fill(0);
    field[..value.len()].copy_from_slice(value.as_bytes());
}

fn read_text(bytes: &[u8], offset: usize, len: usize) -> Result<String, HashFileError> {
    let field = &bytes[offset..offset + len];
    let end = field.iter().position(|b| *b == 0).unwrap_or(len);
    String::from_utf8(field[..end].to_vec())
        .map_err(|_| HashFileError::Corrupted("record text is not valid UTF-8".to_string()))
}

impl Record {
    pub fn new(
        id: i32,
        name: impl Into<String>,
        surname: impl Into<String>,
        city: impl Into<String>,
    ) -> Result<Self, HashFileError> {
        let (name, surname, city) = (name.into(), surname.into(), city.into());
        check_field("name", &name, NAME_LEN)?;
        check_field("surname", &surname, SURNAME_LEN)?;
        check_field("city", &city, CITY_LEN)?;
        Ok(Self {
            id,
            name,
            surname,
            city,
        })
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn surname(&self) -> &str {
        &self.surname
    }

    pub fn city(&self) -> &str {
        &self.city
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}, {}", self.id, self.name, self.surname, self.city)
    }
}

impl ByteLength for Record {
    const BYTE_LEN: usize = RECORD_SIZE;
}

impl IntoBytes for Record {
    fn write_bytes(&self, buf: &mut [u8]) {
        write_i32(buf, 0, self.id);
        write_text(buf, NAME_OFFSET, NAME_LEN, &self.name);
        write_text(buf, SURNAME_OFFSET, SURNAME_LEN, &self.surname);
        write_text(buf, CITY_OFFSET, CITY_LEN, &self.city);
        buf[RECORD_SIZE - 1] = 0;
    }
}

impl FromBytes for Record {
    type Error = HashFileError;

    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() < RECORD_SIZE {
            return Err(HashFileError::Corrupted(format!(
                "record slot of {} bytes, expected {}",
                bytes.len(),
                RECORD_SIZE
            )));
        }
        Ok(Self {
            id: read_i32(bytes, 0),
            name: read_text(bytes, NAME_OFFSET, NAME_LEN)?,
            surname: read_text(bytes, SURNAME_OFFSET, SURNAME_LEN)?,
            city: read_text(bytes, CITY_OFFSET, CITY_LEN)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_record_layout() {
        let record = Record::new(7, "Maria", "Papadopoulou", "Athens").unwrap();
        let bytes = record.to_bytes();

        assert_eq!(bytes.len(), 60);
        assert_eq!(&bytes[0..4], &7i32.to_le_bytes());
        assert_eq!(&bytes[4..9], b"Maria");
        assert!(bytes[9..19].iter().all(|b| *b == 0));
        assert_eq!(&bytes[19..31], b"Papadopoulou");
        assert_eq!(&bytes[39..45], b"Athens");
        assert_eq!(bytes[59], 0);

        assert_eq!(Record::from_bytes(&bytes).unwrap(), record);
    }

    #[test]
    fn test_full_width_fields() {
        let name = "a".repeat(NAME_LEN);
        let city = "c".repeat(CITY_LEN);
        let record = Record::new(-3, name.clone(), "", city.clone()).unwrap();
        let decoded = Record::from_bytes(&record.to_bytes()).unwrap();
        assert_eq!(decoded.name(), name);
        assert_eq!(decoded.surname(), "");
        assert_eq!(decoded.city(), city);
        assert_eq!(decoded.id(), -3);
    }

    #[test]
    fn test_field_too_long() {
        let err = Record::new(1, "a".repeat(NAME_LEN + 1), "b", "c").unwrap_err();
        assert!(matches!(err, HashFileError::RecordField { field: "name", .. }));
    }

    #[test]
    fn test_field_with_nul() {
        let err = Record::new(1, "a", "b\0c", "c").unwrap_err();
        assert!(matches!(
            err,
            HashFileError::RecordField {
                field: "surname",
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_utf8_is_corruption() {
        let mut bytes = Record::new(1, "ok", "ok", "ok").unwrap().to_bytes();
        bytes[4] = 0xff;
        assert!(matches!(
            Record::from_bytes(&bytes),
            Err(HashFileError::Corrupted(_))
        ));
    }

    #[test]
    fn test_display_matches_listing_format() {
        let record = Record::new(12, "Nikos", "Ioannou", "Patra").unwrap();
        assert_eq!(record.to_string(), "12, Nikos, Ioannou, Patra");
    }
}
