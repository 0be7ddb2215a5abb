//! Built-in EQ Presets
//!
//! Three-band reductions of the usual 10-band desktop equalizer curves.
//! Each band takes the shape of the curve over its own range.

/// Named EQ preset with Low, Mid and High gains in dB
pub type Preset = (&'static str, [f32; 3]);

/// List of built-in presets
pub const PRESETS: &[Preset] = &[
    ("Flat", [0.0; 3]),
    ("Bass Boost", [6.0, 0.0, 0.0]),
    ("Treble Boost", [0.0, 0.0, 6.0]),
    ("Vocal Clarity", [-3.0, 4.0, 1.0]),
    ("Bass Reduce", [-6.0, 0.0, 0.0]),
    ("Loudness", [4.0, -1.0, 3.0]),
    ("Telephone", [-12.0, 3.0, -12.0]), // Isolates the mid band
    ("Electronic", [4.0, -2.0, 3.0]),
];

/// Look up a preset by name, ignoring ASCII case
pub fn find_preset(name: &str) -> Option<[f32; 3]> {
    PRESETS
        .iter()
        .find(|(preset, _)| preset.eq_ignore_ascii_case(name))
        .map(|(_, gains)| *gains)
}
