//! The compile-time constant value attached to expression nodes.
//!
//! Some operations and literals can have multiple data types. For example,
//! `1 AND 0` may be either a BOOL, BYTE, WORD or LWORD, and `1 + 2` may be
//! signed (e.g. INT) or unsigned (UINT). The data type of each expression
//! is only decided by a later pass, so instead of storing a single constant
//! value we store four, one per interpretation:
//!
//! - bool
//! - uint64
//! - int64
//! - real64
//!
//! Each slot additionally records whether the interpretation overflowed or
//! stopped being a compile-time constant. An overflow in one interpretation
//! must not suppress the others, which is why the slots are independent.
//!
//! No errors are reported from here: whether an overflow actually concerns
//! the expression depends on the data type chosen later.

/// A single interpretation of a constant value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Slot<T> {
    /// Nothing known (the slot does not apply, or no input was constant).
    Undefined,
    /// The interpretation has this compile-time value.
    Valid(T),
    /// The interpretation overflowed or underflowed.
    Overflow,
    /// The value exists at run time but is not a compile-time constant.
    NonConst,
}

impl<T: Copy> Slot<T> {
    pub fn get(&self) -> Option<T> {
        match self {
            Slot::Valid(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Slot::Valid(_))
    }

    pub fn is_overflow(&self) -> bool {
        matches!(self, Slot::Overflow)
    }

    pub fn is_nonconst(&self) -> bool {
        matches!(self, Slot::NonConst)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Slot::Undefined)
    }
}

impl<T: Copy + PartialEq> Slot<T> {
    fn is_value(&self, value: T) -> bool {
        self.get() == Some(value)
    }

    /// The confluence operation at a control-flow join.
    ///
    /// Undefined is the identity. Two equal valid values stay valid;
    /// two different valid values become non-constant, as does mixing
    /// valid with non-constant. An overflow on either side is carried.
    pub fn meet(self, other: Slot<T>) -> Slot<T> {
        match (self, other) {
            (Slot::Undefined, x) => x,
            (x, Slot::Undefined) => x,
            (Slot::Overflow, _) | (_, Slot::Overflow) => Slot::Overflow,
            (Slot::Valid(a), Slot::Valid(b)) => {
                if a == b {
                    Slot::Valid(a)
                } else {
                    Slot::NonConst
                }
            }
            _ => Slot::NonConst,
        }
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Slot::Undefined
    }
}

/// Applies a binary operator to one slot of two operands.
///
/// Both operands valid: the operator runs and reports overflow by
/// returning `None`, so a wrapped result is never observed. Otherwise an
/// overflow on either side wins over non-constness, and anything else
/// leaves the result undefined.
fn binary<T, U>(a: Slot<T>, b: Slot<T>, op: impl FnOnce(T, T) -> Option<U>) -> Slot<U>
where
    T: Copy,
    U: Copy,
{
    match (a, b) {
        (Slot::Valid(x), Slot::Valid(y)) => match op(x, y) {
            Some(v) => Slot::Valid(v),
            None => Slot::Overflow,
        },
        (Slot::Overflow, _) | (_, Slot::Overflow) => Slot::Overflow,
        (Slot::NonConst, _) | (_, Slot::NonConst) => Slot::NonConst,
        _ => Slot::Undefined,
    }
}

/// Applies a unary operator to one slot of an operand.
fn unary<T>(a: Slot<T>, op: impl FnOnce(T) -> Option<T>) -> Slot<T>
where
    T: Copy,
{
    match a {
        Slot::Valid(x) => match op(x) {
            Some(v) => Slot::Valid(v),
            None => Slot::Overflow,
        },
        other => other,
    }
}

/// Checks a floating point result for overflow. Any operation whose
/// result is NaN or an infinity exceeds the range of the data type and
/// counts as an overflow under section 2.5.1.5.2 of the standard.
fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// The comparison operators that consume two values and produce a BOOL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn eval<T: PartialOrd>(&self, a: T, b: T) -> bool {
        match self {
            CompareOp::Eq => a == b,
            CompareOp::Ne => a != b,
            CompareOp::Lt => a < b,
            CompareOp::Le => a <= b,
            CompareOp::Gt => a > b,
            CompareOp::Ge => a >= b,
        }
    }
}

/// The four parallel interpretations of a constant expression.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstValue {
    pub boolean: Slot<bool>,
    pub uint64: Slot<u64>,
    pub int64: Slot<i64>,
    pub real64: Slot<f64>,
}

impl ConstValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of_bool(value: bool) -> Self {
        ConstValue {
            boolean: Slot::Valid(value),
            ..Default::default()
        }
    }

    pub fn of_real64(value: f64) -> Self {
        ConstValue {
            real64: Slot::Valid(value),
            ..Default::default()
        }
    }

    /// The value of something that exists at run time but is not a
    /// compile-time constant in any interpretation.
    pub fn all_non_const() -> Self {
        ConstValue {
            boolean: Slot::NonConst,
            uint64: Slot::NonConst,
            int64: Slot::NonConst,
            real64: Slot::NonConst,
        }
    }

    /// Addition on the unsigned, signed and floating interpretations.
    pub fn add(a: &Self, b: &Self) -> Self {
        ConstValue {
            boolean: Slot::Undefined,
            uint64: binary(a.uint64, b.uint64, |x, y| x.checked_add(y)),
            int64: binary(a.int64, b.int64, |x, y| x.checked_add(y)),
            real64: binary(a.real64, b.real64, |x, y| finite(x + y)),
        }
    }

    pub fn sub(a: &Self, b: &Self) -> Self {
        ConstValue {
            boolean: Slot::Undefined,
            uint64: binary(a.uint64, b.uint64, |x, y| x.checked_sub(y)),
            int64: binary(a.int64, b.int64, |x, y| x.checked_sub(y)),
            real64: binary(a.real64, b.real64, |x, y| finite(x - y)),
        }
    }

    pub fn mul(a: &Self, b: &Self) -> Self {
        ConstValue {
            boolean: Slot::Undefined,
            uint64: binary(a.uint64, b.uint64, |x, y| x.checked_mul(y)),
            int64: binary(a.int64, b.int64, |x, y| x.checked_mul(y)),
            real64: binary(a.real64, b.real64, |x, y| finite(x * y)),
        }
    }

    /// Division. A valid zero divisor is an overflow for the slot even
    /// when the dividend is not a constant.
    pub fn div(a: &Self, b: &Self) -> Self {
        ConstValue {
            boolean: Slot::Undefined,
            uint64: if b.uint64.is_value(0) {
                Slot::Overflow
            } else {
                binary(a.uint64, b.uint64, |x, y| x.checked_div(y))
            },
            int64: if b.int64.is_value(0) {
                Slot::Overflow
            } else {
                // checked_div also rejects i64::MIN / -1
                binary(a.int64, b.int64, |x, y| x.checked_div(y))
            },
            real64: if b.real64.is_value(0.0) {
                Slot::Overflow
            } else {
                binary(a.real64, b.real64, |x, y| finite(x / y))
            },
        }
    }

    /// Remainder. The standard defines `IN1 MOD IN2` as
    /// `IF (IN2 = 0) THEN OUT:=0 ; ELSE OUT:=IN1 - (IN1/IN2)*IN2 ; END_IF`
    /// so a zero divisor yields zero, not an overflow. The signed slot
    /// still overflows for `i64::MIN MOD -1` because the division inside
    /// the defining expression overflows.
    pub fn modulo(a: &Self, b: &Self) -> Self {
        ConstValue {
            boolean: Slot::Undefined,
            uint64: if b.uint64.is_value(0) {
                Slot::Valid(0)
            } else {
                binary(a.uint64, b.uint64, |x, y| x.checked_rem(y))
            },
            int64: if b.int64.is_value(0) {
                Slot::Valid(0)
            } else {
                binary(a.int64, b.int64, |x, y| x.checked_rem(y))
            },
            real64: Slot::Undefined,
        }
    }

    /// Exponentiation: REAL ** ANY_INT produces REAL.
    pub fn power(a: &Self, b: &Self) -> Self {
        let mut real64 = Slot::Undefined;
        if let (Some(base), Some(exp)) = (a.real64.get(), b.int64.get()) {
            real64 = match finite(base.powf(exp as f64)) {
                Some(v) => Slot::Valid(v),
                None => Slot::Overflow,
            };
        }
        if let (Some(base), Some(exp)) = (a.real64.get(), b.uint64.get()) {
            real64 = match finite(base.powf(exp as f64)) {
                Some(v) => Slot::Valid(v),
                None => Slot::Overflow,
            };
        }
        ConstValue {
            boolean: Slot::Undefined,
            uint64: Slot::Undefined,
            int64: Slot::Undefined,
            real64,
        }
    }

    /// Unary negation (multiply by -1). In the unsigned interpretation
    /// only `-0` is representable.
    pub fn neg(a: &Self) -> Self {
        ConstValue {
            boolean: Slot::Undefined,
            uint64: unary(a.uint64, |x| (x == 0).then_some(0)),
            int64: unary(a.int64, |x| x.checked_neg()),
            real64: unary(a.real64, |x| finite(-x)),
        }
    }

    /// Complement: boolean negation on the bool interpretation, bit
    /// inversion on the unsigned interpretation.
    pub fn not(a: &Self) -> Self {
        ConstValue {
            boolean: unary(a.boolean, |x| Some(!x)),
            uint64: unary(a.uint64, |x| Some(!x)),
            int64: Slot::Undefined,
            real64: Slot::Undefined,
        }
    }

    /// AND shares its spelling between the logical and bit-wise
    /// operators, so both interpretations are computed.
    pub fn and(a: &Self, b: &Self) -> Self {
        ConstValue {
            boolean: binary(a.boolean, b.boolean, |x, y| Some(x && y)),
            uint64: binary(a.uint64, b.uint64, |x, y| Some(x & y)),
            int64: Slot::Undefined,
            real64: Slot::Undefined,
        }
    }

    pub fn or(a: &Self, b: &Self) -> Self {
        ConstValue {
            boolean: binary(a.boolean, b.boolean, |x, y| Some(x || y)),
            uint64: binary(a.uint64, b.uint64, |x, y| Some(x | y)),
            int64: Slot::Undefined,
            real64: Slot::Undefined,
        }
    }

    pub fn xor(a: &Self, b: &Self) -> Self {
        ConstValue {
            boolean: binary(a.boolean, b.boolean, |x, y| Some(x ^ y)),
            uint64: binary(a.uint64, b.uint64, |x, y| Some(x ^ y)),
            int64: Slot::Undefined,
            real64: Slot::Undefined,
        }
    }

    /// Comparison consumes two values in any one interpretation and
    /// produces a BOOL. All four are tried so that the comparison
    /// succeeds for whatever interpretation both operands share.
    pub fn compare(a: &Self, b: &Self, op: CompareOp) -> Self {
        fn try_slot<T: Copy + PartialOrd>(
            out: &mut Slot<bool>,
            a: Slot<T>,
            b: Slot<T>,
            op: CompareOp,
        ) {
            let result = binary(a, b, |x, y| Some(op.eval(x, y)));
            if !result.is_undefined() {
                *out = result;
            }
        }

        let mut boolean = Slot::Undefined;
        try_slot(&mut boolean, a.boolean, b.boolean, op);
        try_slot(&mut boolean, a.uint64, b.uint64, op);
        try_slot(&mut boolean, a.int64, b.int64, op);
        try_slot(&mut boolean, a.real64, b.real64, op);
        ConstValue {
            boolean,
            uint64: Slot::Undefined,
            int64: Slot::Undefined,
            real64: Slot::Undefined,
        }
    }

    /// Meet of all four interpretations (see [Slot::meet]).
    pub fn meet(a: &Self, b: &Self) -> Self {
        ConstValue {
            boolean: a.boolean.meet(b.boolean),
            uint64: a.uint64.meet(b.uint64),
            int64: a.int64.meet(b.int64),
            real64: a.real64.meet(b.real64),
        }
    }

    /// Slot-wise intersection over the predecessors of an IL instruction.
    ///
    /// The instruction adopts the first predecessor's value, downgraded
    /// per slot to non-constant wherever any other predecessor does not
    /// carry the identical valid value.
    pub fn intersect_all(values: &[&ConstValue]) -> ConstValue {
        let Some(first) = values.first() else {
            return ConstValue::new();
        };
        let mut result = (*first).clone();
        for value in &values[1..] {
            fn keep<T: Copy + PartialEq>(slot: &mut Slot<T>, other: Slot<T>) {
                let equal = match (slot.get(), other.get()) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                };
                if !equal {
                    *slot = Slot::NonConst;
                }
            }
            keep(&mut result.boolean, value.boolean);
            keep(&mut result.uint64, value.uint64);
            keep(&mut result.int64, value.int64);
            keep(&mut result.real64, value.real64);
        }
        result
    }
}
