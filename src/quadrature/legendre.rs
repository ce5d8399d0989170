//! Legendre polynomials on [-1, 1] and their antiderivatives.
//!
//! Quadrature matrices are assembled in the Legendre basis and mapped to the
//! unit time interval through x = 2τ - 1.

/// Evaluate P_n(x) and P_{n-1}(x) with the three-term recurrence.
///
/// (k+1) P_{k+1}(x) = (2k+1) x P_k(x) - k P_{k-1}(x)
///
/// For `n == 0` the second value is 0.
fn legendre_pair(n: usize, x: f64) -> (f64, f64) {
    if n == 0 {
        return (1.0, 0.0);
    }

    let mut p_prev = 1.0;
    let mut p_curr = x;
    for k in 1..n {
        let p_next = ((2 * k + 1) as f64 * x * p_curr - k as f64 * p_prev) / (k + 1) as f64;
        p_prev = p_curr;
        p_curr = p_next;
    }
    (p_curr, p_prev)
}

/// Evaluate the Legendre polynomial P_n(x).
pub fn legendre(n: usize, x: f64) -> f64 {
    legendre_pair(n, x).0
}

/// Evaluate P_n(x) together with its derivative P'_n(x).
///
/// Uses P'_n(x) = n (x P_n(x) - P_{n-1}(x)) / (x² - 1) in the interior and the
/// closed forms P'_n(±1) = (±1)^{n+1} n(n+1)/2 at the endpoints.
pub fn legendre_and_derivative(n: usize, x: f64) -> (f64, f64) {
    if n == 0 {
        return (1.0, 0.0);
    }
    let (p_n, p_nm1) = legendre_pair(n, x);

    let edge = (n * (n + 1)) as f64 / 2.0;
    let dp_n = if (x - 1.0).abs() < 1e-14 {
        edge
    } else if (x + 1.0).abs() < 1e-14 {
        if n % 2 == 0 { -edge } else { edge }
    } else {
        n as f64 * (x * p_n - p_nm1) / (x * x - 1.0)
    };

    (p_n, dp_n)
}

/// Antiderivative of P_k(2s - 1) over s ∈ [0, a].
///
/// For k ≥ 1: ∫_{-1}^{y} P_k = (P_{k+1}(y) - P_{k-1}(y)) / (2k+1), and the
/// change of variables contributes a factor 1/2.
pub fn legendre_integral(k: usize, a: f64) -> f64 {
    if k == 0 {
        return a;
    }
    let y = 2.0 * a - 1.0;
    (legendre(k + 1, y) - legendre(k - 1, y)) / (2.0 * (2 * k + 1) as f64)
}
