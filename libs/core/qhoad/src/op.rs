use qmath::{
    combinatorics::{binomial_coefficient, next_pascal},
    num::{
        polygamma, Acos, Acosh, Asin, Asinh, Atan, Atanh, Cos, Cosh, Erf, Erfc, Exp, Lgamma, Log,
        Sin, Sinh, Sqrt, Tan, Tanh, Tgamma,
    },
};

const TWO_OVER_SQRT_PI: f64 = std::f64::consts::FRAC_2_SQRT_PI;

// -----------------------------------------------------------------------------
// UnaryOp
// -----------------------------------------------------------------------------
/// Elementary functions of one argument.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum UnaryOp {
    Neg,
    Exp,
    Log,
    Sqrt,
    Erf,
    Erfc,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Asinh,
    Acosh,
    Atanh,
    Tgamma,
    Lgamma,
}

impl UnaryOp {
    /// Value of the function at `x`.
    pub fn value(&self, x: f64) -> f64 {
        match self {
            UnaryOp::Neg => -x,
            UnaryOp::Exp => Exp::exp(x),
            UnaryOp::Log => Log::log(x),
            UnaryOp::Sqrt => Sqrt::sqrt(x),
            UnaryOp::Erf => Erf::erf(x),
            UnaryOp::Erfc => Erfc::erfc(x),
            UnaryOp::Sin => Sin::sin(x),
            UnaryOp::Cos => Cos::cos(x),
            UnaryOp::Tan => Tan::tan(x),
            UnaryOp::Asin => Asin::asin(x),
            UnaryOp::Acos => Acos::acos(x),
            UnaryOp::Atan => Atan::atan(x),
            UnaryOp::Sinh => Sinh::sinh(x),
            UnaryOp::Cosh => Cosh::cosh(x),
            UnaryOp::Tanh => Tanh::tanh(x),
            UnaryOp::Asinh => Asinh::asinh(x),
            UnaryOp::Acosh => Acosh::acosh(x),
            UnaryOp::Atanh => Atanh::atanh(x),
            UnaryOp::Tgamma => Tgamma::tgamma(x),
            UnaryOp::Lgamma => Lgamma::lgamma(x),
        }
    }

    /// Derivatives `[f'(x), f''(x), ..., f⁽ⁿ⁾(x)]` where `fx = f(x)`.
    ///
    /// Higher orders are generated by the recurrence of a linear ODE satisfied
    /// by the function (or by its first derivative).
    pub fn derivatives(&self, x: f64, fx: f64, n: usize) -> Vec<f64> {
        let mut res = Vec::with_capacity(n);
        if n == 0 {
            return res;
        }
        match self {
            UnaryOp::Neg => {
                res.push(-1.0);
                res.resize(n, 0.0);
            }
            UnaryOp::Exp => res.resize(n, fx),
            UnaryOp::Log => {
                let inv = 1.0 / x;
                res.push(inv);
                for k in 1..n {
                    res.push(-(k as f64) * res[k - 1] * inv);
                }
            }
            UnaryOp::Sqrt => {
                let inv = 1.0 / x;
                res.push(0.5 * fx * inv);
                for k in 1..n {
                    res.push(res[k - 1] * inv * -((2 * k - 1) as f64) / 2.0);
                }
            }
            UnaryOp::Erf | UnaryOp::Erfc => {
                let sign = if *self == UnaryOp::Erf { 1.0 } else { -1.0 };
                // g = c exp(-x^2) satisfies g' = -2x g
                res.push(sign * TWO_OVER_SQRT_PI * Exp::exp(-x * x));
                for k in 1..n {
                    let prev2 = if k >= 2 { res[k - 2] } else { 0.0 };
                    res.push(-2.0 * x * res[k - 1] - 2.0 * (k - 1) as f64 * prev2);
                }
            }
            UnaryOp::Sin | UnaryOp::Cos | UnaryOp::Sinh | UnaryOp::Cosh => {
                let (first, second, period_sign) = match self {
                    UnaryOp::Sin => (Cos::cos(x), -fx, -1.0),
                    UnaryOp::Cos => (-Sin::sin(x), -fx, -1.0),
                    UnaryOp::Sinh => (Cosh::cosh(x), fx, 1.0),
                    _ => (Sinh::sinh(x), fx, 1.0),
                };
                res.push(first);
                if n >= 2 {
                    res.push(second);
                }
                for k in 2..n {
                    res.push(period_sign * res[k - 2]);
                }
            }
            UnaryOp::Tan | UnaryOp::Tanh => {
                // f^(k) = P_k(f) with P_0(t) = t
                let plus = *self == UnaryOp::Tan;
                let mut poly = vec![0.0, 1.0];
                for _ in 0..n {
                    poly = next_pascal(&poly, plus);
                    res.push(poly.iter().rev().fold(0.0, |acc, c| acc * fx + c));
                }
            }
            UnaryOp::Asin | UnaryOp::Acos | UnaryOp::Asinh | UnaryOp::Acosh => {
                // g = (±(1 - x^2))^(-1/2) satisfies (1 - x^2) g' = x g up to sign
                let (d, first, sign) = match self {
                    UnaryOp::Asin => (1.0 / (1.0 - x * x), 1.0, 1.0),
                    UnaryOp::Acos => (1.0 / (1.0 - x * x), -1.0, 1.0),
                    UnaryOp::Asinh => (1.0 / (1.0 + x * x), 1.0, -1.0),
                    _ => (1.0 / (x * x - 1.0), 1.0, -1.0),
                };
                res.push(first * Sqrt::sqrt(d));
                for k in 1..n {
                    let prev2 = if k >= 2 { res[k - 2] } else { 0.0 };
                    let km1 = (k - 1) as f64;
                    res.push(sign * ((2 * k - 1) as f64 * x * res[k - 1] + km1 * km1 * prev2) * d);
                }
            }
            UnaryOp::Atan | UnaryOp::Atanh => {
                // g = ±1 / (1 ± x^2) satisfies (1 ± x^2) g' = ∓2x g
                let (d, first) = match self {
                    UnaryOp::Atan => (1.0 / (1.0 + x * x), 1.0),
                    _ => (1.0 / (x * x - 1.0), -1.0),
                };
                res.push(first * d);
                for k in 1..n {
                    let prev2 = if k >= 2 { res[k - 2] } else { 0.0 };
                    let kf = k as f64;
                    res.push(-(2.0 * kf * x * res[k - 1] + kf * (kf - 1.0) * prev2) * d);
                }
            }
            UnaryOp::Tgamma => {
                // Γ' = Γ ψ, hence Γ^(k+1) = Σ_j C(k, j) Γ^(k-j) ψ^(j)
                let psi: Vec<_> = (0..n).map(|j| polygamma(j, x)).collect();
                let mut gam = Vec::with_capacity(n + 1);
                gam.push(fx);
                for k in 0..n {
                    let next = (0..=k)
                        .map(|j| binomial_coefficient(k, j) as f64 * gam[k - j] * psi[j])
                        .sum();
                    gam.push(next);
                }
                res.extend_from_slice(&gam[1..]);
            }
            UnaryOp::Lgamma => res.extend((0..n).map(|k| polygamma(k, x))),
        }
        res
    }
}

// -----------------------------------------------------------------------------
// BinaryOp
// -----------------------------------------------------------------------------
/// Arithmetic operations of two arguments.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum BinaryOp {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    Div,
}

impl BinaryOp {
    #[inline]
    pub fn value(&self, x: f64, y: f64) -> f64 {
        match self {
            BinaryOp::Add => x + y,
            BinaryOp::Sub => x - y,
            BinaryOp::Mul => x * y,
            BinaryOp::Div => x / y,
        }
    }

    /// Non-constant Taylor terms of `f(x + dx, y + dy)` up to total order `max_order`.
    ///
    /// Each item `(a, b, w)` stands for `w dx^a dy^b`.
    pub fn taylor_terms(&self, x: f64, y: f64, max_order: usize) -> Vec<(usize, usize, f64)> {
        let mut res = match self {
            BinaryOp::Add => vec![(1, 0, 1.0), (0, 1, 1.0)],
            BinaryOp::Sub => vec![(1, 0, 1.0), (0, 1, -1.0)],
            BinaryOp::Mul => vec![(1, 0, y), (0, 1, x), (1, 1, 1.0)],
            BinaryOp::Div => {
                // (x + dx) / (y + dy) = (x + dx) Σ_b (-dy)^b / y^(b+1)
                let inv = 1.0 / y;
                let mut res = Vec::with_capacity(2 * max_order);
                let mut coef = inv;
                for b in 0..max_order {
                    res.push((1, b, coef));
                    coef *= -inv;
                    res.push((0, b + 1, x * coef));
                }
                res
            }
        };
        res.retain(|(a, b, _)| a + b <= max_order);
        res
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rstest::rstest;
    use strum::IntoEnumIterator;

    use super::*;

    fn _domain_point(op: UnaryOp) -> f64 {
        match op {
            UnaryOp::Acosh => 1.3,
            UnaryOp::Tgamma | UnaryOp::Lgamma => 2.7,
            _ => 0.4,
        }
    }

    #[test]
    fn test_first_derivative_against_finite_difference() {
        let h = 1e-6;
        for op in UnaryOp::iter() {
            let x = _domain_point(op);
            let ders = op.derivatives(x, op.value(x), 2);
            let fd = (op.value(x + h) - op.value(x - h)) / (2.0 * h);
            let fd2 = (op.value(x + 1e-4) - 2.0 * op.value(x) + op.value(x - 1e-4)) / 1e-8;

            assert_eq!(ders.len(), 2);
            assert_relative_eq!(ders[0], fd, max_relative = 1e-7, epsilon = 1e-9);
            assert_relative_eq!(ders[1], fd2, max_relative = 1e-4, epsilon = 1e-6);
        }
    }

    #[rstest]
    #[case(UnaryOp::Exp, 0.4, [1.4918246976412703, 1.4918246976412703, 1.4918246976412703, 1.4918246976412703])]
    #[case(UnaryOp::Log, 0.4, [2.5, -6.25, 31.25, -234.375])]
    #[case(UnaryOp::Sqrt, 0.4, [0.7905694150420949, -0.9882117688026185, 3.7057941330098196, -23.161213331311373])]
    #[case(UnaryOp::Erf, 0.4, [0.9615412988393078, -0.7692330390714462, -1.3076961664214586, 4.123089089422952])]
    #[case(UnaryOp::Erfc, 1.2, [-0.26734434700353915, 0.641626432808494, -1.0052147447333073, -0.15399034387403854])]
    #[case(UnaryOp::Sin, 0.4, [0.9210609940028851, -0.38941834230865047, -0.9210609940028851, 0.38941834230865047])]
    #[case(UnaryOp::Cos, 0.4, [-0.38941834230865047, -0.9210609940028851, 0.38941834230865047, 0.9210609940028851])]
    #[case(UnaryOp::Tan, 0.4, [1.1787541058109752, 0.9967384849932918, 3.6217510285534886, 10.111961039294677])]
    #[case(UnaryOp::Asin, 0.4, [1.0910894511799618, 0.5195664053237914, 2.041153735200609, 7.334015585352837])]
    #[case(UnaryOp::Acos, 0.4, [-1.0910894511799618, -0.5195664053237914, -2.041153735200609, -7.334015585352837])]
    #[case(UnaryOp::Atan, 0.4, [0.8620689655172413, -0.5945303210463734, -0.6662839804830046, 4.453675413308147])]
    #[case(UnaryOp::Sinh, 0.4, [1.0810723718384547, 0.4107523258028155, 1.0810723718384547, 0.4107523258028155])]
    #[case(UnaryOp::Cosh, 0.4, [0.4107523258028155, 1.0810723718384547, 0.4107523258028155, 1.0810723718384547])]
    #[case(UnaryOp::Tanh, 0.4, [0.8556387860811777, -0.6501981376737277, -0.9701512491541174, 4.075224392081779])]
    #[case(UnaryOp::Asinh, 0.4, [0.9284766908852593, -0.3201643761673308, -0.46920641334867447, 1.912991664971269])]
    #[case(UnaryOp::Acosh, 1.3, [1.203858530857692, -2.2681392610362314, 11.07519505388929, -91.18291421179052])]
    #[case(UnaryOp::Atanh, 0.4, [1.1904761904761905, 1.1337868480725624, 4.994061116510096, 22.367223533404292])]
    #[case(UnaryOp::Tgamma, 2.7, [1.2307796833525972, 1.6714666893832903, 2.1283234570103975, 3.4753192171025113])]
    #[case(UnaryOp::Lgamma, 2.7, [0.796783168991141, 0.44721206891832366, -0.19700583557913576, 0.17117980334609886])]
    fn test_derivative_table(#[case] op: UnaryOp, #[case] x: f64, #[case] expected: [f64; 4]) {
        let ders = op.derivatives(x, op.value(x), 4);

        assert_eq!(ders.len(), 4);
        for (d, e) in ders.iter().zip(expected.iter()) {
            assert_relative_eq!(*d, *e, max_relative = 1e-10);
        }
    }

    #[rstest]
    #[case(UnaryOp::Tan, 29088885112832.0, 15863556541826077.027)]
    #[case(UnaryOp::Tanh, -29088885112832.0, -186136829308596.17142)]
    fn test_tan_tanh_order_20(#[case] op: UnaryOp, #[case] at_zero: f64, #[case] at_x: f64) {
        // odd derivatives at zero are signed tangent numbers
        let ders = op.derivatives(0.0, 0.0, 20);
        assert_eq!(ders.len(), 20);
        assert_relative_eq!(ders[18], at_zero, max_relative = 1e-14);
        assert_eq!(ders[19], 0.0);

        let x = 0.3;
        let ders = op.derivatives(x, op.value(x), 20);
        assert!(ders.iter().all(|d| d.is_finite()));
        assert_relative_eq!(ders[19], at_x, max_relative = 1e-12);
    }

    #[test]
    fn test_neg_derivatives() {
        assert_eq!(UnaryOp::Neg.derivatives(1.5, -1.5, 3), vec![-1.0, 0.0, 0.0]);
        assert!(UnaryOp::Exp.derivatives(1.5, 1.5f64.exp(), 0).is_empty());
    }

    #[rstest]
    #[case(BinaryOp::Add, "+")]
    #[case(BinaryOp::Sub, "-")]
    #[case(BinaryOp::Mul, "*")]
    #[case(BinaryOp::Div, "/")]
    fn test_binary_symbol(#[case] op: BinaryOp, #[case] symbol: &str) {
        assert_eq!(op.to_string(), symbol);
        assert_eq!(symbol.parse::<BinaryOp>().unwrap(), op);
    }

    #[test]
    fn test_unary_name() {
        assert_eq!(UnaryOp::Erfc.to_string(), "erfc");
        assert_eq!("tgamma".parse::<UnaryOp>().unwrap(), UnaryOp::Tgamma);
    }

    #[test]
    fn test_div_taylor_terms_reproduce_quotient() {
        let (x, y) = (1.2, 0.4);
        let (dx, dy): (f64, f64) = (1e-2, -2e-2);
        let terms = BinaryOp::Div.taylor_terms(x, y, 12);
        let approx: f64 = terms
            .iter()
            .map(|(a, b, w)| w * dx.powi(*a as i32) * dy.powi(*b as i32))
            .sum();

        assert_relative_eq!(x / y + approx, (x + dx) / (y + dy), max_relative = 1e-13);
        assert!(terms.iter().all(|(a, b, _)| a + b <= 12));
    }

    #[test]
    fn test_mul_taylor_terms_truncated() {
        assert_eq!(
            BinaryOp::Mul.taylor_terms(2.0, 3.0, 1),
            vec![(1, 0, 3.0), (0, 1, 2.0)]
        );
        assert!(BinaryOp::Add.taylor_terms(2.0, 3.0, 0).is_empty());
    }
}
