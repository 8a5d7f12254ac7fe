//! # Primitive Cryptography Types
//!
//! Key types for the NIST prime curves, with the small set of point
//! operations key agreement needs. All arithmetic is delegated to the
//! constant-time routines of the underlying curve implementations.

use std::fmt::{self, Debug, Display};

use elliptic_curve::group::{Curve as _, Group};
use elliptic_curve::sec1::{EncodedPoint, FromEncodedPoint, ModulusSize, ToEncodedPoint};
use elliptic_curve::{
    CurveArithmetic, FieldBytes, PublicKey as TypedPublicKey, SecretKey as TypedSecretKey, ecdh,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::Error;
use crate::codec::to_fixed_width;

/// Cryptographic curve type.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub enum Curve {
    /// secp256r1 curve.
    #[default]
    #[serde(rename = "P-256")]
    P256,

    /// secp384r1 curve.
    #[serde(rename = "P-384")]
    P384,

    /// secp521r1 curve.
    #[serde(rename = "P-521")]
    P521,
}

impl Curve {
    /// The width of a field element in bytes (⌈bitsize/8⌉). Coordinates and
    /// scalars are encoded big-endian at exactly this width.
    #[must_use]
    pub const fn coordinate_size(self) -> usize {
        match self {
            Self::P256 => 32,
            Self::P384 => 48,
            Self::P521 => 66,
        }
    }
}

impl Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::P256 => write!(f, "P-256"),
            Self::P384 => write!(f, "P-384"),
            Self::P521 => write!(f, "P-521"),
        }
    }
}

/// A validated affine point on one of the supported curves.
///
/// Coordinates are held in fixed-width big-endian form, ready for JWK
/// encoding. Construction checks the curve equation, so every value of this
/// type is a point on its claimed curve.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PublicKey {
    curve: Curve,
    x: Vec<u8>,
    y: Vec<u8>,
}

impl PublicKey {
    /// Build a public key from big-endian X and Y coordinates.
    ///
    /// Coordinates shorter than the curve's field width are left-padded.
    ///
    /// # Errors
    ///
    /// Returns an error if a coordinate is wider than the field or the point
    /// is not on the curve.
    pub fn from_coordinates(curve: Curve, x: &[u8], y: &[u8]) -> Result<Self, Error> {
        let x = to_fixed_width(x, curve.coordinate_size())?;
        let y = to_fixed_width(y, curve.coordinate_size())?;

        // constructing the typed point checks the curve equation
        match curve {
            Curve::P256 => decode_point::<p256::NistP256>(curve, &x, &y).map(|_| ())?,
            Curve::P384 => decode_point::<p384::NistP384>(curve, &x, &y).map(|_| ())?,
            Curve::P521 => decode_point::<p521::NistP521>(curve, &x, &y).map(|_| ())?,
        }

        Ok(Self { curve, x, y })
    }

    /// The curve this point belongs to.
    #[must_use]
    pub const fn curve(&self) -> Curve {
        self.curve
    }

    /// The X coordinate in fixed-width big-endian form.
    #[must_use]
    pub fn x(&self) -> &[u8] {
        &self.x
    }

    /// The Y coordinate in fixed-width big-endian form.
    #[must_use]
    pub fn y(&self) -> &[u8] {
        &self.y
    }

    /// EC point addition.
    ///
    /// # Errors
    ///
    /// Returns an error if the points are on different curves or the sum is
    /// the point at infinity.
    pub fn add(&self, other: &Self) -> Result<Self, Error> {
        if self.curve != other.curve {
            return Err(Error::CurveMismatch { expected: self.curve, found: other.curve });
        }

        let (x, y) = match self.curve {
            Curve::P256 => add_points::<p256::NistP256>(self, other)?,
            Curve::P384 => add_points::<p384::NistP384>(self, other)?,
            Curve::P521 => add_points::<p521::NistP521>(self, other)?,
        };

        Ok(Self { curve: self.curve, x, y })
    }

    /// EC point subtraction, returning the affine X coordinate of the
    /// difference as a shared secret. The Y coordinate is wiped.
    ///
    /// # Errors
    ///
    /// Returns an error if the points are on different curves or the
    /// difference is the point at infinity.
    pub fn sub(&self, other: &Self) -> Result<SharedSecret, Error> {
        if self.curve != other.curve {
            return Err(Error::CurveMismatch { expected: self.curve, found: other.curve });
        }

        let x = match self.curve {
            Curve::P256 => sub_points::<p256::NistP256>(self, other)?,
            Curve::P384 => sub_points::<p384::NistP384>(self, other)?,
            Curve::P521 => sub_points::<p521::NistP521>(self, other)?,
        };

        Ok(SharedSecret(x))
    }
}

/// A secret scalar for one of the supported curves.
///
/// The scalar is wiped when the key is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    #[zeroize(skip)]
    curve: Curve,
    d: Vec<u8>,
}

impl SecretKey {
    /// Generate a new random key for the given curve.
    #[must_use]
    pub fn generate(curve: Curve) -> Self {
        let d = match curve {
            Curve::P256 => random_scalar::<p256::NistP256>(),
            Curve::P384 => random_scalar::<p384::NistP384>(),
            Curve::P521 => random_scalar::<p521::NistP521>(),
        };
        Self { curve, d }
    }

    /// Build a secret key from a big-endian scalar.
    ///
    /// Scalars shorter than the curve's field width are left-padded.
    ///
    /// # Errors
    ///
    /// Returns an error if the scalar is wider than the field, zero, or not
    /// less than the curve order.
    pub fn from_bytes(curve: Curve, d: &[u8]) -> Result<Self, Error> {
        let d = to_fixed_width(d, curve.coordinate_size())?;

        match curve {
            Curve::P256 => decode_scalar::<p256::NistP256>(curve, &d).map(|_| ())?,
            Curve::P384 => decode_scalar::<p384::NistP384>(curve, &d).map(|_| ())?,
            Curve::P521 => decode_scalar::<p521::NistP521>(curve, &d).map(|_| ())?,
        }

        Ok(Self { curve, d })
    }

    /// The curve this key belongs to.
    #[must_use]
    pub const fn curve(&self) -> Curve {
        self.curve
    }

    /// The public key for this secret scalar.
    ///
    /// # Errors
    ///
    /// Returns an error if the scalar fails to decode, which cannot happen
    /// for keys built through [`SecretKey::generate`] or
    /// [`SecretKey::from_bytes`].
    pub fn public_key(&self) -> Result<PublicKey, Error> {
        let (x, y) = match self.curve {
            Curve::P256 => public_coordinates::<p256::NistP256>(self.curve, &self.d)?,
            Curve::P384 => public_coordinates::<p384::NistP384>(self.curve, &self.d)?,
            Curve::P521 => public_coordinates::<p521::NistP521>(self.curve, &self.d)?,
        };
        Ok(PublicKey { curve: self.curve, x, y })
    }

    /// Derive a shared secret from this key and the peer's public key: the
    /// affine X coordinate of `d · P` in fixed-width big-endian form.
    ///
    /// # Errors
    ///
    /// Returns an error if the peer key is on a different curve.
    pub fn diffie_hellman(&self, peer: &PublicKey) -> Result<SharedSecret, Error> {
        if self.curve != peer.curve {
            return Err(Error::CurveMismatch { expected: self.curve, found: peer.curve });
        }

        let z = match self.curve {
            Curve::P256 => dh::<p256::NistP256>(self.curve, &self.d, peer)?,
            Curve::P384 => dh::<p384::NistP384>(self.curve, &self.d, peer)?,
            Curve::P521 => dh::<p521::NistP521>(self.curve, &self.d, peer)?,
        };

        Ok(SharedSecret(z))
    }

    /// Scalar multiplication `d · P`, returning the full product point.
    ///
    /// # Errors
    ///
    /// Returns an error if the point is on a different curve or the product
    /// is the point at infinity.
    pub fn scalar_mul(&self, point: &PublicKey) -> Result<PublicKey, Error> {
        if self.curve != point.curve {
            return Err(Error::CurveMismatch { expected: self.curve, found: point.curve });
        }

        let (x, y) = match self.curve {
            Curve::P256 => mul_point::<p256::NistP256>(self.curve, &self.d, point)?,
            Curve::P384 => mul_point::<p384::NistP384>(self.curve, &self.d, point)?,
            Curve::P521 => mul_point::<p521::NistP521>(self.curve, &self.d, point)?,
        };

        Ok(PublicKey { curve: self.curve, x, y })
    }
}

impl Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey").field("curve", &self.curve).finish_non_exhaustive()
    }
}

/// A shared secret derived through key agreement.
///
/// The secret is wiped when dropped. Callers needing a longer-lived copy
/// must take ownership of one explicitly.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret(Vec<u8>);

impl SharedSecret {
    /// Return the shared secret as a byte slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSecret").finish_non_exhaustive()
    }
}

fn decode_point<C>(curve: Curve, x: &[u8], y: &[u8]) -> Result<TypedPublicKey<C>, Error>
where
    C: CurveArithmetic,
    C::AffinePoint: FromEncodedPoint<C> + ToEncodedPoint<C>,
    C::FieldBytesSize: ModulusSize,
{
    let point = EncodedPoint::<C>::from_affine_coordinates(
        FieldBytes::<C>::from_slice(x),
        FieldBytes::<C>::from_slice(y),
        false,
    );
    Option::from(TypedPublicKey::<C>::from_encoded_point(&point)).ok_or(Error::NotOnCurve(curve))
}

fn encode_point<C>(point: &C::AffinePoint) -> Result<(Vec<u8>, Vec<u8>), Error>
where
    C: CurveArithmetic,
    C::AffinePoint: ToEncodedPoint<C>,
    C::FieldBytesSize: ModulusSize,
{
    let encoded = point.to_encoded_point(false);
    match (encoded.x(), encoded.y()) {
        (Some(x), Some(y)) => Ok((x.to_vec(), y.to_vec())),
        _ => Err(Error::PointAtInfinity),
    }
}

fn decode_scalar<C>(curve: Curve, d: &[u8]) -> Result<TypedSecretKey<C>, Error>
where
    C: CurveArithmetic,
{
    TypedSecretKey::<C>::from_slice(d).map_err(|_| Error::InvalidSecretKey(curve))
}

fn random_scalar<C>() -> Vec<u8>
where
    C: CurveArithmetic,
{
    let secret = TypedSecretKey::<C>::random(&mut OsRng);
    let mut bytes = secret.to_bytes();
    let d = bytes.to_vec();
    bytes.as_mut_slice().zeroize();
    d
}

fn public_coordinates<C>(curve: Curve, d: &[u8]) -> Result<(Vec<u8>, Vec<u8>), Error>
where
    C: CurveArithmetic,
    C::AffinePoint: ToEncodedPoint<C>,
    C::FieldBytesSize: ModulusSize,
{
    let secret = decode_scalar::<C>(curve, d)?;
    encode_point::<C>(secret.public_key().as_affine())
}

fn dh<C>(curve: Curve, d: &[u8], peer: &PublicKey) -> Result<Vec<u8>, Error>
where
    C: CurveArithmetic,
    C::AffinePoint: FromEncodedPoint<C> + ToEncodedPoint<C>,
    C::FieldBytesSize: ModulusSize,
{
    let secret = decode_scalar::<C>(curve, d)?;
    let public = decode_point::<C>(peer.curve, &peer.x, &peer.y)?;
    let shared = ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
    Ok(shared.raw_secret_bytes().to_vec())
}

fn mul_point<C>(curve: Curve, d: &[u8], point: &PublicKey) -> Result<(Vec<u8>, Vec<u8>), Error>
where
    C: CurveArithmetic,
    C::AffinePoint: FromEncodedPoint<C> + ToEncodedPoint<C>,
    C::FieldBytesSize: ModulusSize,
{
    let scalar = decode_scalar::<C>(curve, d)?.to_nonzero_scalar();
    let public = decode_point::<C>(point.curve, &point.x, &point.y)?;
    let product = C::ProjectivePoint::from(*public.as_affine()) * *scalar;

    if bool::from(product.is_identity()) {
        return Err(Error::PointAtInfinity);
    }
    encode_point::<C>(&product.to_affine())
}

fn add_points<C>(a: &PublicKey, b: &PublicKey) -> Result<(Vec<u8>, Vec<u8>), Error>
where
    C: CurveArithmetic,
    C::AffinePoint: FromEncodedPoint<C> + ToEncodedPoint<C>,
    C::FieldBytesSize: ModulusSize,
{
    let pa = decode_point::<C>(a.curve, &a.x, &a.y)?;
    let pb = decode_point::<C>(b.curve, &b.x, &b.y)?;
    let sum =
        C::ProjectivePoint::from(*pa.as_affine()) + C::ProjectivePoint::from(*pb.as_affine());

    if bool::from(sum.is_identity()) {
        return Err(Error::PointAtInfinity);
    }
    encode_point::<C>(&sum.to_affine())
}

fn sub_points<C>(a: &PublicKey, b: &PublicKey) -> Result<Vec<u8>, Error>
where
    C: CurveArithmetic,
    C::AffinePoint: FromEncodedPoint<C> + ToEncodedPoint<C>,
    C::FieldBytesSize: ModulusSize,
{
    let pa = decode_point::<C>(a.curve, &a.x, &a.y)?;
    let pb = decode_point::<C>(b.curve, &b.x, &b.y)?;
    let diff =
        C::ProjectivePoint::from(*pa.as_affine()) - C::ProjectivePoint::from(*pb.as_affine());

    if bool::from(diff.is_identity()) {
        return Err(Error::PointAtInfinity);
    }

    let (x, mut y) = encode_point::<C>(&diff.to_affine())?;
    y.zeroize();
    Ok(x)
}
