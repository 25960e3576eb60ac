use crate::common::config::{ATTR_ENCODED_LEN, ATTR_NAME_LEN, PAGE_SIZE, TABLE_HEADER_FIXED_LEN};
use crate::error::{Error, Result};

use super::record::Record;
use super::value::{DataType, Value};

/// One column of a table's schema: a name, a data type, and its fixed
/// byte length (4 for int/float, 1 for bool, the declared length for a
/// string).
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub data_type: DataType,
    pub type_length: usize,
}

impl Attribute {
    pub fn int(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: DataType::Int,
            type_length: 4,
        }
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: DataType::Float,
            type_length: 4,
        }
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: DataType::Bool,
            type_length: 1,
        }
    }

    pub fn string(name: impl Into<String>, len: usize) -> Self {
        Self {
            name: name.into(),
            data_type: DataType::String,
            type_length: len,
        }
    }
}

/// A table's column list plus the subset of attribute indices forming its
/// key. `key_attrs[i]` names an attribute index; the indices it occupies
/// on the wire (attribute slots `0..key_attrs.len()`) are a storage
/// artifact of the original encoding, not a claim that attribute `i`
/// itself is a key column.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub attributes: Vec<Attribute>,
    pub key_attrs: Vec<i32>,
}

impl Schema {
    pub fn new(attributes: Vec<Attribute>, key_attrs: Vec<i32>) -> Self {
        Self {
            attributes,
            key_attrs,
        }
    }

    pub fn num_attr(&self) -> usize {
        self.attributes.len()
    }

    pub fn key_size(&self) -> usize {
        self.key_attrs.len()
    }

    /// Sum of every attribute's byte length — the size of one record's
    /// payload, not counting the tombstone byte.
    pub fn record_size(&self) -> usize {
        self.attributes.iter().map(|a| a.type_length).sum()
    }

    /// Byte offset of attribute `attr_num` within a record's payload.
    pub fn attr_offset(&self, attr_num: usize) -> usize {
        self.attributes[..attr_num].iter().map(|a| a.type_length).sum()
    }

    /// Size this schema would occupy on page 0: the fixed header plus
    /// `ATTR_ENCODED_LEN` bytes per attribute.
    pub fn encoded_len(&self) -> usize {
        TABLE_HEADER_FIXED_LEN + self.attributes.len() * ATTR_ENCODED_LEN
    }

    pub fn get_attr(&self, record: &Record, attr_num: usize) -> Value {
        let attr = &self.attributes[attr_num];
        let off = self.attr_offset(attr_num);
        let bytes = &record.data[off..off + attr.type_length];
        match attr.data_type {
            DataType::Int => Value::Int(i32::from_ne_bytes(bytes.try_into().unwrap())),
            DataType::Float => Value::Float(f32::from_ne_bytes(bytes.try_into().unwrap())),
            DataType::Bool => Value::Bool(bytes[0] != 0),
            DataType::String => {
                let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                Value::Str(String::from_utf8_lossy(&bytes[..end]).into_owned())
            }
        }
    }

    pub fn set_attr(&self, record: &mut Record, attr_num: usize, value: &Value) {
        let attr = &self.attributes[attr_num];
        let off = self.attr_offset(attr_num);
        let len = attr.type_length;
        match (attr.data_type, value) {
            (DataType::Int, Value::Int(v)) => {
                record.data[off..off + len].copy_from_slice(&v.to_ne_bytes())
            }
            (DataType::Float, Value::Float(v)) => {
                record.data[off..off + len].copy_from_slice(&v.to_ne_bytes())
            }
            (DataType::Bool, Value::Bool(v)) => record.data[off] = *v as u8,
            (DataType::String, Value::Str(s)) => {
                let bytes = s.as_bytes();
                let n = bytes.len().min(len);
                record.data[off..off + n].copy_from_slice(&bytes[..n]);
                for b in &mut record.data[off + n..off + len] {
                    *b = 0;
                }
            }
            _ => panic!(
                "value {value:?} does not match attribute {}'s data type {:?}",
                attr.name, attr.data_type
            ),
        }
    }

    /// Writes `recCnt`, `initFreePg`, `numAttr`, `keySize`, then each
    /// attribute's `name(64) + dataType(4) + typeLength(4) + keyAttrIndex(4)`
    /// into a zero-filled page-0 buffer.
    pub(crate) fn serialize_into(&self, buf: &mut [u8; PAGE_SIZE], rec_cnt: i32, init_free_pg: i32) {
        buf.fill(0);
        let mut off = 0usize;
        buf[off..off + 4].copy_from_slice(&rec_cnt.to_ne_bytes());
        off += 4;
        buf[off..off + 4].copy_from_slice(&init_free_pg.to_ne_bytes());
        off += 4;
        buf[off..off + 4].copy_from_slice(&(self.attributes.len() as i32).to_ne_bytes());
        off += 4;
        buf[off..off + 4].copy_from_slice(&(self.key_attrs.len() as i32).to_ne_bytes());
        off += 4;

        for (i, attr) in self.attributes.iter().enumerate() {
            let name_bytes = attr.name.as_bytes();
            let n = name_bytes.len().min(ATTR_NAME_LEN);
            buf[off..off + n].copy_from_slice(&name_bytes[..n]);
            off += ATTR_NAME_LEN;

            buf[off..off + 4].copy_from_slice(&(attr.data_type as i32).to_ne_bytes());
            off += 4;
            buf[off..off + 4].copy_from_slice(&(attr.type_length as i32).to_ne_bytes());
            off += 4;

            let key_idx = if i < self.key_attrs.len() {
                self.key_attrs[i]
            } else {
                0
            };
            buf[off..off + 4].copy_from_slice(&key_idx.to_ne_bytes());
            off += 4;
        }
    }

    /// Reads `(recCnt, initFreePg, Schema)` back out of a page-0 buffer.
    pub(crate) fn deserialize_from(buf: &[u8; PAGE_SIZE]) -> Result<(i32, i32, Schema)> {
        let read_i32 = |b: &[u8]| i32::from_ne_bytes(b.try_into().unwrap());

        let rec_cnt = read_i32(&buf[0..4]);
        let init_free_pg = read_i32(&buf[4..8]);
        let num_attr = read_i32(&buf[8..12]) as usize;
        let key_size = read_i32(&buf[12..16]) as usize;

        if TABLE_HEADER_FIXED_LEN + num_attr * ATTR_ENCODED_LEN > PAGE_SIZE {
            return Err(Error::LargeSchema);
        }

        let mut off = TABLE_HEADER_FIXED_LEN;
        let mut attributes = Vec::with_capacity(num_attr);
        let mut key_attrs = Vec::with_capacity(key_size);

        for i in 0..num_attr {
            let name_bytes = &buf[off..off + ATTR_NAME_LEN];
            let end = name_bytes.iter().position(|&b| b == 0).unwrap_or(ATTR_NAME_LEN);
            let name = String::from_utf8_lossy(&name_bytes[..end]).into_owned();
            off += ATTR_NAME_LEN;

            let data_type = DataType::from_i32(read_i32(&buf[off..off + 4]));
            off += 4;
            let type_length = read_i32(&buf[off..off + 4]) as usize;
            off += 4;
            let key_idx = read_i32(&buf[off..off + 4]);
            off += 4;

            if i < key_size {
                key_attrs.push(key_idx);
            }

            attributes.push(Attribute {
                name,
                data_type,
                type_length,
            });
        }

        Ok((
            rec_cnt,
            init_free_pg,
            Schema {
                attributes,
                key_attrs,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> Schema {
        Schema::new(
            vec![Attribute::int("a"), Attribute::string("b", 4)],
            vec![0],
        )
    }

    #[test]
    fn record_size_sums_attribute_lengths() {
        assert_eq!(sample_schema().record_size(), 8);
    }

    #[test]
    fn attr_offset_is_cumulative() {
        let s = sample_schema();
        assert_eq!(s.attr_offset(0), 0);
        assert_eq!(s.attr_offset(1), 4);
    }

    #[test]
    fn schema_round_trips_through_page_zero() {
        let schema = sample_schema();
        let mut buf = Box::new([0u8; PAGE_SIZE]);
        schema.serialize_into(&mut buf, 3, 7);

        let (rec_cnt, init_free_pg, restored) = Schema::deserialize_from(&buf).unwrap();
        assert_eq!(rec_cnt, 3);
        assert_eq!(init_free_pg, 7);
        assert_eq!(restored, schema);
    }

    #[test]
    fn get_and_set_attr_round_trip() {
        let schema = sample_schema();
        let mut record = Record::new(&schema);
        schema.set_attr(&mut record, 0, &Value::Int(42));
        schema.set_attr(&mut record, 1, &Value::Str("abcd".to_string()));

        assert_eq!(schema.get_attr(&record, 0), Value::Int(42));
        assert_eq!(schema.get_attr(&record, 1), Value::Str("abcd".to_string()));
    }
}
