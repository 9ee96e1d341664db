//! `serde(with = ...)` adapters for curve scalars and points.
//!
//! Human-readable formats get base64 strings; binary formats get
//! fixed-width byte tuples so no length prefix is written.

extern crate alloc;

use alloc::{string::String, vec::Vec};
use core::{
    fmt::{self, Formatter},
    marker::PhantomData,
};
use serde::{
    de::{Error as DeError, SeqAccess, Visitor},
    ser::SerializeTuple,
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::BulletproofCurveArithmetic;

fn encode_fixed<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
    if s.is_human_readable() {
        data_encoding::BASE64.encode(bytes).serialize(s)
    } else {
        let mut tupler = s.serialize_tuple(bytes.len())?;
        for b in bytes {
            tupler.serialize_element(b)?;
        }
        tupler.end()
    }
}

struct FixedBytesVisitor(usize);

impl<'de> Visitor<'de> for FixedBytesVisitor {
    type Value = Vec<u8>;

    fn expecting(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "a sequence of {} bytes", self.0)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut bytes = Vec::<u8>::with_capacity(self.0);
        for i in 0..self.0 {
            bytes.push(
                seq.next_element()?
                    .ok_or_else(|| A::Error::invalid_length(i, &self))?,
            );
        }
        Ok(bytes)
    }
}

fn decode_fixed<'de, D: Deserializer<'de>>(len: usize, d: D) -> Result<Vec<u8>, D::Error> {
    if d.is_human_readable() {
        let value = String::deserialize(d)?;
        data_encoding::BASE64
            .decode(value.as_bytes())
            .map_err(|_| D::Error::custom("invalid base64"))
    } else {
        d.deserialize_tuple(len, FixedBytesVisitor(len))
    }
}

fn decode_base64_list<E: DeError>(items: &[String]) -> Result<Vec<Vec<u8>>, E> {
    items
        .iter()
        .map(|b64| {
            data_encoding::BASE64
                .decode(b64.as_bytes())
                .map_err(|_| E::custom("invalid base64"))
        })
        .collect()
}

pub struct CurveScalar<C: BulletproofCurveArithmetic> {
    _marker: PhantomData<C>,
}

impl<C: BulletproofCurveArithmetic> CurveScalar<C> {
    pub fn serialize<S: Serializer>(scalar: &C::Scalar, s: S) -> Result<S::Ok, S::Error> {
        encode_fixed(&C::serialize_scalar(scalar), s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<C::Scalar, D::Error> {
        let bytes = decode_fixed(C::SCALAR_BYTES, d)?;
        C::deserialize_scalar(&bytes).map_err(|_| D::Error::custom("invalid scalar"))
    }
}

pub struct CurvePoint<C: BulletproofCurveArithmetic> {
    _marker: PhantomData<C>,
}

impl<C: BulletproofCurveArithmetic> CurvePoint<C> {
    pub fn serialize<S: Serializer>(point: &C::Point, s: S) -> Result<S::Ok, S::Error> {
        encode_fixed(&C::serialize_point(point), s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<C::Point, D::Error> {
        let bytes = decode_fixed(C::POINT_BYTES, d)?;
        C::deserialize_point(&bytes).map_err(|_| D::Error::custom("invalid point"))
    }
}

pub struct CurvePointVec<C: BulletproofCurveArithmetic> {
    _marker: PhantomData<C>,
}

impl<C: BulletproofCurveArithmetic> CurvePointVec<C> {
    pub fn serialize<S: Serializer>(points_vec: &Vec<C::Point>, s: S) -> Result<S::Ok, S::Error> {
        if s.is_human_readable() {
            let points: Vec<String> = points_vec
                .iter()
                .map(|p| data_encoding::BASE64.encode(&C::serialize_point(p)))
                .collect();
            points.serialize(s)
        } else {
            let mut bytes = Vec::<u8>::with_capacity(points_vec.len() * C::POINT_BYTES);
            for point in points_vec {
                bytes.append(&mut C::serialize_point(point));
            }
            s.serialize_bytes(&bytes)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<C::Point>, D::Error> {
        let chunks = if d.is_human_readable() {
            decode_base64_list::<D::Error>(&Vec::<String>::deserialize(d)?)?
        } else {
            let bytes = Vec::<u8>::deserialize(d)?;
            if bytes.len() % C::POINT_BYTES != 0 {
                return Err(D::Error::custom("invalid bytes length"));
            }
            bytes.chunks_exact(C::POINT_BYTES).map(|c| c.to_vec()).collect()
        };
        chunks
            .iter()
            .map(|b| C::deserialize_point(b).map_err(|_| D::Error::custom("invalid point")))
            .collect()
    }
}

pub struct CurveScalarVec<C: BulletproofCurveArithmetic> {
    _marker: PhantomData<C>,
}

impl<C: BulletproofCurveArithmetic> CurveScalarVec<C> {
    pub fn serialize<S: Serializer>(
        scalars_vec: &Vec<C::Scalar>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        if s.is_human_readable() {
            let scalars: Vec<String> = scalars_vec
                .iter()
                .map(|k| data_encoding::BASE64.encode(&C::serialize_scalar(k)))
                .collect();
            scalars.serialize(s)
        } else {
            let mut bytes = Vec::<u8>::with_capacity(scalars_vec.len() * C::SCALAR_BYTES);
            for scalar in scalars_vec {
                bytes.append(&mut C::serialize_scalar(scalar));
            }
            s.serialize_bytes(&bytes)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<C::Scalar>, D::Error> {
        let chunks = if d.is_human_readable() {
            decode_base64_list::<D::Error>(&Vec::<String>::deserialize(d)?)?
        } else {
            let bytes = Vec::<u8>::deserialize(d)?;
            if bytes.len() % C::SCALAR_BYTES != 0 {
                return Err(D::Error::custom("invalid bytes length"));
            }
            bytes.chunks_exact(C::SCALAR_BYTES).map(|c| c.to_vec()).collect()
        };
        chunks
            .iter()
            .map(|b| C::deserialize_scalar(b).map_err(|_| D::Error::custom("invalid scalar")))
            .collect()
    }
}
