//! secp256k1 point arithmetic in affine coordinates
//!
//! Coordinates live in the field modulo `P`; scalars live modulo the group
//! order `N`. The two moduli are exposed through separate accessors and the
//! point code only ever reduces by `P`.

use num_bigint::{BigInt, BigUint, Sign};
use std::sync::OnceLock;
use thiserror::Error;

const P_HEX: &[u8] = b"FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEFFFFFC2F";
const N_HEX: &[u8] = b"FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141";
const GX_HEX: &[u8] = b"79BE667EF9DCBBAC55A06295CE870B07029BFCDB2DCE28D959F2815B16F81798";
const GY_HEX: &[u8] = b"483ADA7726A3C4655DA4FBFC0E1108A8FD17B448A68554199C47D08FFB10D4B8";

/// Curve errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CurveError {
    #[error("Point is not on secp256k1")]
    NotOnCurve,
    #[error("Invalid point encoding")]
    InvalidEncoding,
    #[error("Point at infinity has no affine encoding")]
    Infinity,
}

struct CurveParams {
    p: BigUint,
    n: BigUint,
    half_n: BigUint,
    g: Point,
}

fn params() -> &'static CurveParams {
    static PARAMS: OnceLock<CurveParams> = OnceLock::new();
    PARAMS.get_or_init(|| {
        let parse = |hex: &[u8]| BigUint::parse_bytes(hex, 16).unwrap_or_default();
        let n = parse(N_HEX);
        CurveParams {
            p: parse(P_HEX),
            half_n: &n >> 1u32,
            n,
            g: Point::Affine {
                x: parse(GX_HEX),
                y: parse(GY_HEX),
            },
        }
    })
}

/// Field prime `P`
pub fn field_prime() -> &'static BigUint {
    &params().p
}

/// Group order `N`
pub fn curve_order() -> &'static BigUint {
    &params().n
}

/// `N / 2`, the low-S boundary
pub fn half_order() -> &'static BigUint {
    &params().half_n
}

/// Generator point `G`
pub fn generator() -> &'static Point {
    &params().g
}

/// Non-negative residue of `a` modulo `m`
fn reduce(a: BigInt, m: &BigUint) -> BigUint {
    let m = BigInt::from(m.clone());
    let r = a % &m;
    let r = if r.sign() == Sign::Minus { r + &m } else { r };
    r.to_biguint().unwrap_or_default()
}

/// Modular inverse by the extended Euclidean algorithm.
///
/// Returns `None` when `a ≡ 0 (mod m)`.
pub fn mod_inverse(a: &BigUint, m: &BigUint) -> Option<BigUint> {
    let a = a % m;
    if a == BigUint::ZERO {
        return None;
    }

    let mut low = BigInt::from(a);
    let mut high = BigInt::from(m.clone());
    let mut lm = BigInt::from(1u8);
    let mut hm = BigInt::ZERO;
    let one = BigInt::from(1u8);

    while low > one {
        let ratio = &high / &low;
        let nm = &hm - &lm * &ratio;
        let nw = &high - &low * &ratio;
        hm = std::mem::replace(&mut lm, nm);
        high = std::mem::replace(&mut low, nw);
    }

    Some(reduce(lm, m))
}

/// `(a - b) mod m` for values already reduced below `m`
fn sub_mod(a: &BigUint, b: &BigUint, m: &BigUint) -> BigUint {
    if a >= b {
        a - b
    } else {
        m - (b - a)
    }
}

/// A point on secp256k1
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Point {
    /// The identity element
    Infinity,
    Affine { x: BigUint, y: BigUint },
}

impl Point {
    /// Build an affine point, checking the curve equation `y² = x³ + 7`
    pub fn new(x: BigUint, y: BigUint) -> Result<Self, CurveError> {
        let point = Point::Affine { x, y };
        if !point.is_on_curve() {
            return Err(CurveError::NotOnCurve);
        }
        Ok(point)
    }

    pub fn is_infinity(&self) -> bool {
        matches!(self, Point::Infinity)
    }

    pub fn is_on_curve(&self) -> bool {
        match self {
            Point::Infinity => true,
            Point::Affine { x, y } => {
                let p = field_prime();
                if x >= p || y >= p {
                    return false;
                }
                let lhs = (y * y) % p;
                let rhs = (x * x % p * x + BigUint::from(7u8)) % p;
                lhs == rhs
            }
        }
    }

    pub fn x(&self) -> Option<&BigUint> {
        match self {
            Point::Infinity => None,
            Point::Affine { x, .. } => Some(x),
        }
    }

    pub fn y(&self) -> Option<&BigUint> {
        match self {
            Point::Infinity => None,
            Point::Affine { y, .. } => Some(y),
        }
    }

    /// `-P`
    pub fn negate(&self) -> Point {
        match self {
            Point::Infinity => Point::Infinity,
            Point::Affine { x, y } => {
                let p = field_prime();
                let y = if *y == BigUint::ZERO { BigUint::ZERO } else { p - y };
                Point::Affine { x: x.clone(), y }
            }
        }
    }

    /// `P + Q`
    pub fn add(&self, other: &Point) -> Point {
        let (x1, y1, x2, y2) = match (self, other) {
            (Point::Infinity, _) => return other.clone(),
            (_, Point::Infinity) => return self.clone(),
            (Point::Affine { x: x1, y: y1 }, Point::Affine { x: x2, y: y2 }) => (x1, y1, x2, y2),
        };

        if x1 == x2 {
            if y1 == y2 {
                return self.double();
            }
            // P + (-P)
            return Point::Infinity;
        }

        let p = field_prime();
        let dx = sub_mod(x2, x1, p);
        let dy = sub_mod(y2, y1, p);
        let inv = match mod_inverse(&dx, p) {
            Some(inv) => inv,
            None => return Point::Infinity,
        };
        let slope = dy * inv % p;
        let x3 = sub_mod(&sub_mod(&(&slope * &slope % p), x1, p), x2, p);
        let y3 = sub_mod(&(&slope * sub_mod(x1, &x3, p) % p), y1, p);
        Point::Affine { x: x3, y: y3 }
    }

    /// `2P`
    pub fn double(&self) -> Point {
        let (x, y) = match self {
            Point::Infinity => return Point::Infinity,
            Point::Affine { x, y } => (x, y),
        };
        if *y == BigUint::ZERO {
            return Point::Infinity;
        }

        let p = field_prime();
        let numerator = BigUint::from(3u8) * x % p * x % p;
        let inv = match mod_inverse(&((y << 1u32) % p), p) {
            Some(inv) => inv,
            None => return Point::Infinity,
        };
        let slope = numerator * inv % p;
        let x3 = sub_mod(&(&slope * &slope % p), &((x << 1u32) % p), p);
        let y3 = sub_mod(&(&slope * sub_mod(x, &x3, p) % p), y, p);
        Point::Affine { x: x3, y: y3 }
    }

    /// `k·P` by double-and-add; `k = 0` yields the identity
    pub fn mul(&self, k: &BigUint) -> Point {
        let mut result = Point::Infinity;
        let mut addend = self.clone();
        let bits = k.bits();
        for i in 0..bits {
            if k.bit(i) {
                result = result.add(&addend);
            }
            if i + 1 < bits {
                addend = addend.double();
            }
        }
        result
    }

    /// 65-byte SEC1 uncompressed encoding `04 ‖ x ‖ y`
    pub fn to_uncompressed(&self) -> Result<[u8; 65], CurveError> {
        let (x, y) = match self {
            Point::Infinity => return Err(CurveError::Infinity),
            Point::Affine { x, y } => (x, y),
        };
        let mut out = [0u8; 65];
        out[0] = 0x04;
        out[1..33].copy_from_slice(&to_be_32(x));
        out[33..65].copy_from_slice(&to_be_32(y));
        Ok(out)
    }

    /// Parse a 65-byte uncompressed encoding
    pub fn from_uncompressed(bytes: &[u8]) -> Result<Self, CurveError> {
        if bytes.len() != 65 || bytes[0] != 0x04 {
            return Err(CurveError::InvalidEncoding);
        }
        Point::new(
            BigUint::from_bytes_be(&bytes[1..33]),
            BigUint::from_bytes_be(&bytes[33..65]),
        )
    }
}

/// Big-endian 32-byte rendering, left-padded with zeros
pub fn to_be_32(value: &BigUint) -> [u8; 32] {
    let bytes = value.to_bytes_be();
    let mut out = [0u8; 32];
    let start = 32usize.saturating_sub(bytes.len());
    let skip = bytes.len().saturating_sub(32);
    out[start..].copy_from_slice(&bytes[skip..]);
    out
}
