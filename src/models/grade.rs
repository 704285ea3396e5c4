/// Converts a mean opinion score into its ITU-T P.800 category label.
///
/// | Range       | Label     |
/// |-------------|-----------|
/// | >= 4.5      | Excellent |
/// | >= 3.5      | Good      |
/// | >= 2.5      | Fair      |
/// | >= 1.5      | Poor      |
/// | < 1.5       | Bad       |
pub fn grade(mos: f64) -> String {
    match mos {
        m if m >= 4.5 => "Excellent".into(),
        m if m >= 3.5 => "Good".into(),
        m if m >= 2.5 => "Fair".into(),
        m if m >= 1.5 => "Poor".into(),
        _ => "Bad".into(),
    }
}
