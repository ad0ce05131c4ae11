//! Unit categories and unit-string parsing
//!
//! A unit string is reduced to exponents over a small set of base
//! dimensions and compared against the dimensions a category allows.
//! `mm`, `1/angstrom`, `kg/m^3` and `counts/s/cm2` are all understood.

use regex::Regex;
use std::sync::LazyLock;

/// Exponents over length, mass, time, current, temperature, amount, plane
/// angle and solid angle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dim([i8; 8]);

const L: usize = 0;
const M: usize = 1;
const T: usize = 2;
const I: usize = 3;
const K: usize = 4;
const N: usize = 5;
const A: usize = 6;
const S: usize = 7;

impl Dim {
    pub const NONE: Dim = Dim([0; 8]);

    const fn of(pairs: &[(usize, i8)]) -> Dim {
        let mut exps = [0_i8; 8];
        let mut idx = 0;
        while idx < pairs.len() {
            exps[pairs[idx].0] = pairs[idx].1;
            idx += 1;
        }
        Dim(exps)
    }

    /// Add `rhs` raised to `power`; `None` when an exponent leaves `i8`
    fn checked_add_pow(self, rhs: Dim, power: i8) -> Option<Dim> {
        let mut out = self.0;
        for (slot, exp) in out.iter_mut().zip(rhs.0) {
            *slot = slot.checked_add(exp.checked_mul(power)?)?;
        }
        Some(Dim(out))
    }
}

const LENGTH: Dim = Dim::of(&[(L, 1)]);
const MASS: Dim = Dim::of(&[(M, 1)]);
const TIME: Dim = Dim::of(&[(T, 1)]);
const CURRENT: Dim = Dim::of(&[(I, 1)]);
const TEMPERATURE: Dim = Dim::of(&[(K, 1)]);
const AMOUNT: Dim = Dim::of(&[(N, 1)]);
const ANGLE: Dim = Dim::of(&[(A, 1)]);
const SOLID_ANGLE: Dim = Dim::of(&[(S, 1)]);
const FREQUENCY: Dim = Dim::of(&[(T, -1)]);
const FORCE: Dim = Dim::of(&[(M, 1), (L, 1), (T, -2)]);
const PRESSURE: Dim = Dim::of(&[(M, 1), (L, -1), (T, -2)]);
const ENERGY: Dim = Dim::of(&[(M, 1), (L, 2), (T, -2)]);
const POWER: Dim = Dim::of(&[(M, 1), (L, 2), (T, -3)]);
const CHARGE: Dim = Dim::of(&[(I, 1), (T, 1)]);
const VOLTAGE: Dim = Dim::of(&[(M, 1), (L, 2), (T, -3), (I, -1)]);
const RESISTANCE: Dim = Dim::of(&[(M, 1), (L, 2), (T, -3), (I, -2)]);
const MAGNETIC_FIELD: Dim = Dim::of(&[(M, 1), (T, -2), (I, -1)]);
const AREA: Dim = Dim::of(&[(L, 2)]);
const VOLUME: Dim = Dim::of(&[(L, 3)]);
const PER_LENGTH: Dim = Dim::of(&[(L, -1)]);
const PER_AREA: Dim = Dim::of(&[(L, -2)]);
const MASS_DENSITY: Dim = Dim::of(&[(M, 1), (L, -3)]);
const MOLAR_MASS: Dim = Dim::of(&[(M, 1), (N, -1)]);
const FLUX: Dim = Dim::of(&[(T, -1), (L, -2)]);
const EMITTANCE: Dim = Dim::of(&[(L, 1), (A, 1)]);

/// Symbols that accept an SI prefix
const PREFIXABLE: &[(&str, Dim)] = &[
    ("m", LENGTH),
    ("g", MASS),
    ("s", TIME),
    ("A", CURRENT),
    ("K", TEMPERATURE),
    ("mol", AMOUNT),
    ("rad", ANGLE),
    ("Hz", FREQUENCY),
    ("N", FORCE),
    ("Pa", PRESSURE),
    ("bar", PRESSURE),
    ("J", ENERGY),
    ("eV", ENERGY),
    ("cal", ENERGY),
    ("W", POWER),
    ("C", CHARGE),
    ("V", VOLTAGE),
    ("Ohm", RESISTANCE),
    ("Ω", RESISTANCE),
    ("T", MAGNETIC_FIELD),
    ("L", VOLUME),
    ("l", VOLUME),
    ("barn", AREA),
];

/// Symbols matched only verbatim
const FIXED: &[(&str, Dim)] = &[
    ("Å", LENGTH),
    ("angstrom", LENGTH),
    ("Angstrom", LENGTH),
    ("ang", LENGTH),
    ("micron", LENGTH),
    ("in", LENGTH),
    ("inch", LENGTH),
    ("ft", LENGTH),
    ("deg", ANGLE),
    ("degree", ANGLE),
    ("degrees", ANGLE),
    ("°", ANGLE),
    ("arcmin", ANGLE),
    ("arcsec", ANGLE),
    ("sr", SOLID_ANGLE),
    ("second", TIME),
    ("seconds", TIME),
    ("min", TIME),
    ("minute", TIME),
    ("minutes", TIME),
    ("h", TIME),
    ("hr", TIME),
    ("hour", TIME),
    ("hours", TIME),
    ("day", TIME),
    ("days", TIME),
    ("degC", TEMPERATURE),
    ("°C", TEMPERATURE),
    ("celsius", TEMPERATURE),
    ("Celsius", TEMPERATURE),
    ("degF", TEMPERATURE),
    ("°F", TEMPERATURE),
    ("atm", PRESSURE),
    ("torr", PRESSURE),
    ("Torr", PRESSURE),
    ("mmHg", PRESSURE),
    ("psi", PRESSURE),
    ("erg", ENERGY),
    ("amu", MASS),
    ("Da", MASS),
    ("u", MASS),
    ("e", CHARGE),
    ("counts", Dim::NONE),
    ("count", Dim::NONE),
    ("cts", Dim::NONE),
    ("photons", Dim::NONE),
    ("events", Dim::NONE),
    ("%", Dim::NONE),
    ("percent", Dim::NONE),
    ("ppm", Dim::NONE),
];

const SI_PREFIXES: &[&str] = &[
    "da", "Y", "Z", "E", "P", "T", "G", "M", "k", "h", "d", "c", "m", "u", "µ", "μ", "n", "p", "f",
    "a", "z", "y",
];

static TOKEN: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(
        r"(?P<num>\d+(?:\.\d+)?)|(?P<sym>[A-Za-zÅµμ°%Ω]+)(?:\^|\*\*)?(?P<exp>[-+]?\d+)?|(?P<op>[/*·.()])|(?P<ws>\s+)",
    )
});

fn lookup_symbol(symbol: &str) -> Option<Dim> {
    let exact = FIXED
        .iter()
        .chain(PREFIXABLE)
        .find(|(name, _)| *name == symbol)
        .map(|(_, dim)| *dim);
    if exact.is_some() {
        return exact;
    }
    SI_PREFIXES.iter().find_map(|prefix| {
        let base = symbol.strip_prefix(prefix)?;
        PREFIXABLE
            .iter()
            .find(|(name, _)| *name == base)
            .map(|(_, dim)| *dim)
    })
}

/// Reduce a unit string to its dimensions
///
/// Returns `None` when the string contains anything that is not a known
/// unit symbol, number, exponent, or operator.
pub fn parse_units(units: &str) -> Option<Dim> {
    let token = TOKEN.as_ref().ok()?;
    let units = units.trim();
    let mut total = Dim::NONE;
    let mut expected_start = 0;
    let mut divide_next = false;
    let mut group_signs: Vec<i8> = vec![1];

    for caps in token.captures_iter(units) {
        let whole = caps.get(0)?;
        if whole.start() != expected_start {
            return None;
        }
        expected_start = whole.end();

        let sign = *group_signs.last()? * if divide_next { -1 } else { 1 };
        if let Some(sym) = caps.name("sym") {
            let dim = lookup_symbol(sym.as_str())?;
            let exp = match caps.name("exp") {
                Some(e) => e.as_str().parse::<i8>().ok()?,
                None => 1,
            };
            total = total.checked_add_pow(dim, exp.checked_mul(sign)?)?;
            divide_next = false;
        } else if caps.name("num").is_some() {
            divide_next = false;
        } else if let Some(op) = caps.name("op") {
            match op.as_str() {
                "/" => divide_next = true,
                "(" => {
                    group_signs.push(sign);
                    divide_next = false;
                }
                ")" => {
                    if group_signs.len() < 2 {
                        return None;
                    }
                    group_signs.pop();
                }
                _ => {}
            }
        }
    }

    if expected_start != units.len() || group_signs.len() != 1 {
        return None;
    }
    Some(total)
}

/// Dimensions each category allows; `None` for unknown categories
fn allowed_dimensions(category: &str) -> Option<&'static [Dim]> {
    let dims: &'static [Dim] = match category {
        "NX_LENGTH" | "NX_WAVELENGTH" => &[LENGTH],
        "NX_AREA" | "NX_CROSS_SECTION" => &[AREA],
        "NX_VOLUME" => &[VOLUME],
        "NX_PER_LENGTH" | "NX_WAVENUMBER" => &[PER_LENGTH],
        "NX_PER_AREA" | "NX_SCATTERING_LENGTH_DENSITY" => &[PER_AREA],
        "NX_MASS" => &[MASS],
        "NX_MASS_DENSITY" => &[MASS_DENSITY],
        "NX_MOLECULAR_WEIGHT" => &[MOLAR_MASS],
        "NX_TIME" | "NX_TIME_OF_FLIGHT" | "NX_PERIOD" => &[TIME],
        "NX_FREQUENCY" => &[FREQUENCY],
        "NX_CURRENT" => &[CURRENT],
        "NX_CHARGE" => &[CHARGE],
        "NX_VOLTAGE" => &[VOLTAGE],
        "NX_ENERGY" => &[ENERGY],
        "NX_POWER" => &[POWER],
        "NX_PRESSURE" => &[PRESSURE],
        "NX_TEMPERATURE" => &[TEMPERATURE],
        "NX_ANGLE" => &[ANGLE],
        "NX_SOLID_ANGLE" => &[SOLID_ANGLE],
        "NX_FLUX" => &[FLUX],
        "NX_EMITTANCE" => &[EMITTANCE],
        "NX_COUNT" | "NX_DIMENSIONLESS" | "NX_UNITLESS" => &[Dim::NONE],
        "NX_TRANSFORMATION" => &[LENGTH, ANGLE, Dim::NONE],
        _ => return None,
    };
    Some(dims)
}

/// Check a unit string against a category
///
/// Returns `None` when the category is unknown, otherwise whether the
/// units belong to it. `NX_ANY` accepts everything.
pub fn accepts(category: &str, units: &str) -> Option<bool> {
    if category == "NX_ANY" {
        return Some(true);
    }
    let allowed = allowed_dimensions(category)?;
    if units.trim().is_empty() {
        return Some(allowed.contains(&Dim::NONE));
    }
    Some(parse_units(units).is_some_and(|dim| allowed.contains(&dim)))
}
