//! Built-in scenarios
//!
//! Units throughout are AU, years and solar masses, which makes
//! G = 4 pi^2 ~ 39.5.

/// The Sun and the four inner planets
pub const INNER_SOLAR_SYSTEM: &str = r#"
# Sun, Mercury, Venus, Earth and Mars
system G = 39.5 dt = 0.008 softening = 0.15

body Sun at (-1.50324727873647e-6, -3.93762725944737e-6, -4.86567877183925e-8) velocity (3.1669325898331e-5, -6.85489559263319e-6, -7.90076642683254e-7) mass 1
body Mercury at (-0.346390408691506, -0.272465544507684, 0.00951633403684172) velocity (4.25144321778261, -7.61778341459925, -1.01249478583175) mass 1.65956463e-7
body Venus at (-0.168003526072526, 0.698844725464528, 0.0192761582256879) velocity (-7.2077847105093, -1.76778886124455, 0.391700036358566) mass 2.44699613e-6
body Earth at (0.648778995445634, 0.747994953300324, -3.44317239114194e-5) velocity (-4.85085087312141, 4.09601920470267, -0.000258553333305496) mass 3.0024584e-6
body Mars at (-0.574871406752105, -1.395455041953879, -0.01515164037265145) velocity (4.9225288800471425, -1.5065904473191791, -0.1524041758922603) mass 3.213e-7

simulate steps = 125
detect sun_earth = distance(Sun, Earth)
detect energy = energy()
"#;

/// Two equal stars on a circular orbit about their common center
pub const BINARY: &str = r#"
let G = 39.5
let soft = 0.15
let m = 0.5
let d = 1
# circular speed under the softened force law
let v = sqrt(G * m / (2 * sqrt(d * d + soft)))

system G = G dt = 0.002 softening = soft
body A at (-d / 2, 0, 0) velocity (0, -v, 0) mass m
body B at (d / 2, 0, 0) velocity (0, v, 0) mass m

simulate steps = 1000
detect separation = distance(A, B)
detect momentum = momentum()
"#;

/// Names accepted by [`by_name`]
pub const NAMES: &[&str] = &["inner-solar-system", "binary"];

pub fn by_name(name: &str) -> Option<&'static str> {
    match name {
        "inner-solar-system" => Some(INNER_SOLAR_SYSTEM),
        "binary" => Some(BINARY),
        _ => None,
    }
}
