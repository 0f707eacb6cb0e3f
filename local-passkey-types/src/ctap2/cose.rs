use ciborium::value::Value;
use coset::{
    iana::{self, EnumI64},
    CborSerializable, CoseKey, CoseKeyBuilder, Label, RegisteredLabel, RegisteredLabelWithPrivate,
};

use super::CodecError;

/// Length of one affine coordinate of a P-256 point.
const COORDINATE_LEN: usize = 32;

/// SEC1 tag of an uncompressed point.
const UNCOMPRESSED_TAG: u8 = 0x04;

const UNCOMPRESSED_POINT_LEN: usize = 1 + 2 * COORDINATE_LEN;

/// An ES256 credential public key, the affine coordinates of a point on P-256.
///
/// Secure key hardware hands out public keys as uncompressed SEC1 points (`0x04 || X || Y`),
/// while authenticator data carries them as a COSE_Key. This type converts between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ec2PublicKey {
    x: [u8; COORDINATE_LEN],
    y: [u8; COORDINATE_LEN],
}

impl Ec2PublicKey {
    /// Length of an uncompressed P-256 point.
    pub const UNCOMPRESSED_LEN: usize = UNCOMPRESSED_POINT_LEN;

    /// Parse an uncompressed SEC1 point.
    ///
    /// The point is not checked to be on the curve, it is taken as given by the key provider.
    pub fn from_uncompressed(point: &[u8]) -> Result<Self, CodecError> {
        let Some((&tag, coordinates)) = point.split_first() else {
            return Err(CodecError::MalformedPublicKey(0));
        };
        if tag != UNCOMPRESSED_TAG {
            return Err(CodecError::MalformedPublicKey(tag));
        }
        if point.len() != Self::UNCOMPRESSED_LEN {
            return Err(CodecError::PublicKeyLength {
                expected: Self::UNCOMPRESSED_LEN,
                actual: point.len(),
            });
        }
        let (x, y) = coordinates.split_at(COORDINATE_LEN);

        Ok(Self {
            x: x.try_into().map_err(|_| CodecError::Truncated)?,
            y: y.try_into().map_err(|_| CodecError::Truncated)?,
        })
    }

    /// The uncompressed SEC1 form of the point.
    pub fn to_uncompressed(&self) -> [u8; UNCOMPRESSED_POINT_LEN] {
        let mut point = [0; UNCOMPRESSED_POINT_LEN];
        point[0] = UNCOMPRESSED_TAG;
        point[1..=COORDINATE_LEN].copy_from_slice(&self.x);
        point[1 + COORDINATE_LEN..].copy_from_slice(&self.y);
        point
    }

    /// The X coordinate.
    pub fn x(&self) -> &[u8; 32] {
        &self.x
    }

    /// The Y coordinate.
    pub fn y(&self) -> &[u8; 32] {
        &self.y
    }

    /// Build the structured COSE_Key.
    pub fn to_cose_key(&self) -> CoseKey {
        CoseKeyBuilder::new_ec2_pub_key(
            iana::EllipticCurve::P_256,
            self.x.to_vec(),
            self.y.to_vec(),
        )
        .algorithm(iana::Algorithm::ES256)
        .build()
    }

    /// Encode as the CBOR map `{1: 2, 3: -7, -1: 1, -2: X, -3: Y}`.
    ///
    /// Entries are written in exactly that order, which is the CTAP2 canonical order for these
    /// labels, so the same point always produces the same bytes.
    pub fn to_cose_vec(&self) -> Result<Vec<u8>, CodecError> {
        let entry = |label: i64, value: Value| (Value::Integer(label.into()), value);
        let map = Value::Map(vec![
            entry(
                iana::KeyParameter::Kty.to_i64(),
                Value::Integer(iana::KeyType::EC2.to_i64().into()),
            ),
            entry(
                iana::KeyParameter::Alg.to_i64(),
                Value::Integer(iana::Algorithm::ES256.to_i64().into()),
            ),
            entry(
                iana::Ec2KeyParameter::Crv.to_i64(),
                Value::Integer(iana::EllipticCurve::P_256.to_i64().into()),
            ),
            entry(iana::Ec2KeyParameter::X.to_i64(), Value::Bytes(self.x.to_vec())),
            entry(iana::Ec2KeyParameter::Y.to_i64(), Value::Bytes(self.y.to_vec())),
        ]);

        let mut out = Vec::with_capacity(77);
        ciborium::ser::into_writer(&map, &mut out)?;
        Ok(out)
    }

    /// Decode a CBOR encoded COSE_Key.
    pub fn from_cose_slice(data: &[u8]) -> Result<Self, CodecError> {
        let key = CoseKey::from_slice(data)?;
        Self::from_cose_key(&key)
    }

    /// Extract the point from a COSE_Key, which must be an ES256 key on P-256.
    pub fn from_cose_key(key: &CoseKey) -> Result<Self, CodecError> {
        if !matches!(key.kty, RegisteredLabel::Assigned(iana::KeyType::EC2)) {
            return Err(CodecError::UnsupportedCoseKey("key type is not EC2"));
        }
        if !matches!(
            key.alg,
            Some(RegisteredLabelWithPrivate::Assigned(iana::Algorithm::ES256))
        ) {
            return Err(CodecError::UnsupportedCoseKey("algorithm is not ES256"));
        }

        let (mut crv, mut x, mut y) = (None, None, None);
        for (label, value) in &key.params {
            let Label::Int(i) = label else {
                continue;
            };
            let slot = match iana::Ec2KeyParameter::from_i64(*i) {
                Some(iana::Ec2KeyParameter::Crv) => &mut crv,
                Some(iana::Ec2KeyParameter::X) => &mut x,
                Some(iana::Ec2KeyParameter::Y) => &mut y,
                _ => continue,
            };
            if slot.replace(value).is_some() {
                return Err(CodecError::UnsupportedCoseKey("duplicate key parameter"));
            }
        }

        let p256 = Value::Integer(iana::EllipticCurve::P_256.to_i64().into());
        if crv != Some(&p256) {
            return Err(CodecError::UnsupportedCoseKey("curve is not P-256"));
        }
        let coordinate = |value: Option<&Value>| -> Result<[u8; COORDINATE_LEN], CodecError> {
            value
                .and_then(Value::as_bytes)
                .and_then(|bytes| bytes.as_slice().try_into().ok())
                .ok_or(CodecError::UnsupportedCoseKey("coordinate is not 32 bytes"))
        };

        Ok(Self {
            x: coordinate(x)?,
            y: coordinate(y)?,
        })
    }
}
