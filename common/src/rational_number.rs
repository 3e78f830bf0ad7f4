use dashu_int::IBig;

pub type RationalNumber = num_rational::Ratio<u64>;

/// `ceil(n / d)` for non-negative `n` and positive `d`
pub fn ceil_div(n: &IBig, d: &IBig) -> IBig {
    (n + d - IBig::ONE) / d
}

/// `ceil(Σ ratio * units)`, computed exactly over big integers so the rounding happens once
pub fn ceil_of_sum(terms: impl IntoIterator<Item = (RationalNumber, u64)>) -> IBig {
    let mut numer = IBig::ZERO;
    let mut denom = IBig::ONE;
    for (ratio, units) in terms {
        let n = IBig::from(*ratio.numer()) * IBig::from(units);
        let d = IBig::from(*ratio.denom());
        numer = numer * &d + n * &denom;
        denom *= d;
    }
    ceil_div(&numer, &denom)
}
