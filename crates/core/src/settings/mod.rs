//! User-editable parameters and their declared ranges.
//!
//! [`Settings`] is the single source of truth for every tunable value. Numeric
//! writes are clamped into the declared range instead of being rejected, so a
//! `Settings` value is always renderable.

use std::{fmt, ops::RangeInclusive, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{PulseRingError, Result};

pub const BPM_MIN: u32 = 40;
pub const BPM_MAX: u32 = 220;

/// How the ring is composited over the background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    Normal,
    Add,
    #[default]
    Screen,
}

impl BlendMode {
    pub const ALL: [BlendMode; 3] = [BlendMode::Normal, BlendMode::Add, BlendMode::Screen];

    /// Integer code understood by the render stage.
    pub const fn index(self) -> i32 {
        match self {
            Self::Normal => 0,
            Self::Add => 1,
            Self::Screen => 2,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Add => "add",
            Self::Screen => "screen",
        }
    }
}

impl FromStr for BlendMode {
    type Err = PulseRingError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "add" => Ok(Self::Add),
            "screen" => Ok(Self::Screen),
            _ => Err(PulseRingError::InvalidBlendMode(raw.to_string())),
        }
    }
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 8-bit sRGB color as edited in the control panel (`#rrggbb`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb` or the `#rgb` shorthand. The leading `#` is optional.
    pub fn from_hex(raw: &str) -> Result<Self> {
        let invalid = || PulseRingError::InvalidColor(raw.to_string());
        let digits = raw.trim().trim_start_matches('#');
        if !digits.is_ascii() {
            return Err(invalid());
        }

        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
        match digits.len() {
            6 => Ok(Self::new(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            3 => {
                let short = |i: usize| channel(&digits[i..i + 1]).map(|v| v * 17);
                Ok(Self::new(short(0)?, short(1)?, short(2)?))
            }
            _ => Err(invalid()),
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Converts to linear-light components in `[0, 1]`.
    pub fn to_linear(self) -> [f32; 3] {
        [
            srgb_to_linear(self.r),
            srgb_to_linear(self.g),
            srgb_to_linear(self.b),
        ]
    }
}

impl TryFrom<String> for Rgb {
    type Error = PulseRingError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_hex()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

fn srgb_to_linear(channel: u8) -> f32 {
    let c = channel as f32 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Kind of value a parameter holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Int,
    Float,
    Bool,
    Color,
    Blend,
}

impl ParamKind {
    fn expected(self) -> &'static str {
        match self {
            Self::Int => "integer",
            Self::Float => "finite number",
            Self::Bool => "boolean",
            Self::Color => "color",
            Self::Blend => "blend mode",
        }
    }
}

/// Every named parameter in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamName {
    Bpm,
    PulseStrength,
    RingRadius,
    RingSoftness,
    ColorA,
    ColorB,
    BlendMode,
    /// Derived from [`ParamName::BlendMode`]; readable but never written.
    BlendModeIndex,
    NoiseAmount,
    VignetteAmount,
    Animate,
    UseTexture,
    DistortionAmount,
    RippleSpeed,
    ChromaticAberration,
    ShowRing,
}

impl ParamName {
    pub const ALL: [ParamName; 16] = [
        ParamName::Bpm,
        ParamName::PulseStrength,
        ParamName::RingRadius,
        ParamName::RingSoftness,
        ParamName::ColorA,
        ParamName::ColorB,
        ParamName::BlendMode,
        ParamName::BlendModeIndex,
        ParamName::NoiseAmount,
        ParamName::VignetteAmount,
        ParamName::Animate,
        ParamName::UseTexture,
        ParamName::DistortionAmount,
        ParamName::RippleSpeed,
        ParamName::ChromaticAberration,
        ParamName::ShowRing,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bpm => "bpm",
            Self::PulseStrength => "pulseStrength",
            Self::RingRadius => "ringRadius",
            Self::RingSoftness => "ringSoftness",
            Self::ColorA => "colorA",
            Self::ColorB => "colorB",
            Self::BlendMode => "blendMode",
            Self::BlendModeIndex => "blendModeIndex",
            Self::NoiseAmount => "noiseAmount",
            Self::VignetteAmount => "vignetteAmount",
            Self::Animate => "animate",
            Self::UseTexture => "useTexture",
            Self::DistortionAmount => "distortionAmount",
            Self::RippleSpeed => "rippleSpeed",
            Self::ChromaticAberration => "chromaticAberration",
            Self::ShowRing => "showRing",
        }
    }

    pub const fn kind(self) -> ParamKind {
        match self {
            Self::Bpm | Self::BlendModeIndex => ParamKind::Int,
            Self::ColorA | Self::ColorB => ParamKind::Color,
            Self::BlendMode => ParamKind::Blend,
            Self::Animate | Self::UseTexture | Self::ShowRing => ParamKind::Bool,
            _ => ParamKind::Float,
        }
    }

    /// Declared valid range for numeric parameters.
    pub fn range(self) -> Option<RangeInclusive<f32>> {
        let range = match self {
            Self::Bpm => BPM_MIN as f32..=BPM_MAX as f32,
            Self::PulseStrength => 0.0..=2.0,
            Self::RingRadius => 0.05..=0.6,
            Self::RingSoftness => 0.005..=0.25,
            Self::NoiseAmount => 0.0..=0.35,
            Self::VignetteAmount => 0.0..=1.0,
            Self::DistortionAmount => 0.0..=1.5,
            Self::RippleSpeed => 0.1..=6.0,
            Self::ChromaticAberration => 0.0..=0.05,
            Self::BlendModeIndex => 0.0..=2.0,
            _ => return None,
        };
        Some(range)
    }

    /// Parses a raw textual value (as typed into a control) for this parameter.
    pub fn parse_value(self, raw: &str) -> Result<SettingValue> {
        let mismatch = || PulseRingError::TypeMismatch {
            name: self.as_str(),
            expected: self.kind().expected(),
        };
        let raw = raw.trim();
        match self.kind() {
            ParamKind::Int => raw
                .parse::<i64>()
                .map(SettingValue::Int)
                .or_else(|_| raw.parse::<f32>().map(SettingValue::Float))
                .map_err(|_| mismatch()),
            ParamKind::Float => raw
                .parse::<f32>()
                .map(SettingValue::Float)
                .map_err(|_| mismatch()),
            ParamKind::Bool => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "on" => Ok(SettingValue::Bool(true)),
                "false" | "0" | "off" => Ok(SettingValue::Bool(false)),
                _ => Err(mismatch()),
            },
            ParamKind::Color => Rgb::from_hex(raw).map(SettingValue::Color),
            ParamKind::Blend => raw.parse().map(SettingValue::Blend),
        }
    }
}

impl FromStr for ParamName {
    type Err = PulseRingError;

    fn from_str(raw: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == raw)
            .ok_or_else(|| PulseRingError::UnknownParameter(raw.to_string()))
    }
}

impl fmt::Display for ParamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dynamically typed parameter value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettingValue {
    Int(i64),
    Float(f32),
    Bool(bool),
    Color(Rgb),
    Blend(BlendMode),
}

impl SettingValue {
    fn as_float(self) -> Option<f32> {
        match self {
            Self::Int(v) => Some(v as f32),
            Self::Float(v) if v.is_finite() => Some(v),
            _ => None,
        }
    }

    fn as_int(self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(v),
            Self::Float(v) if v.is_finite() => Some(v.round() as i64),
            _ => None,
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f32> for SettingValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<Rgb> for SettingValue {
    fn from(value: Rgb) -> Self {
        Self::Color(value)
    }
}

impl From<BlendMode> for SettingValue {
    fn from(value: BlendMode) -> Self {
        Self::Blend(value)
    }
}

/// Clamps a tempo estimate into the accepted BPM range.
pub fn clamp_bpm(bpm: i64) -> u32 {
    bpm.clamp(BPM_MIN as i64, BPM_MAX as i64) as u32
}

/// The control-panel state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    bpm: u32,
    pulse_strength: f32,
    ring_radius: f32,
    ring_softness: f32,
    color_a: Rgb,
    color_b: Rgb,
    blend_mode: BlendMode,
    noise_amount: f32,
    vignette_amount: f32,
    animate: bool,
    use_texture: bool,
    distortion_amount: f32,
    ripple_speed: f32,
    chromatic_aberration: f32,
    show_ring: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bpm: 120,
            pulse_strength: 0.8,
            ring_radius: 0.24,
            ring_softness: 0.06,
            color_a: Rgb::new(0x8b, 0x5c, 0xf6),
            color_b: Rgb::new(0x22, 0xd3, 0xee),
            blend_mode: BlendMode::Screen,
            noise_amount: 0.05,
            vignette_amount: 0.45,
            animate: true,
            use_texture: false,
            distortion_amount: 0.35,
            ripple_speed: 1.5,
            chromatic_aberration: 0.01,
            show_ring: true,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    pub fn pulse_strength(&self) -> f32 {
        self.pulse_strength
    }

    pub fn ring_radius(&self) -> f32 {
        self.ring_radius
    }

    pub fn ring_softness(&self) -> f32 {
        self.ring_softness
    }

    pub fn color_a(&self) -> Rgb {
        self.color_a
    }

    pub fn color_b(&self) -> Rgb {
        self.color_b
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    /// Always in step with [`Settings::blend_mode`].
    pub fn blend_mode_index(&self) -> i32 {
        self.blend_mode.index()
    }

    pub fn noise_amount(&self) -> f32 {
        self.noise_amount
    }

    pub fn vignette_amount(&self) -> f32 {
        self.vignette_amount
    }

    pub fn animate(&self) -> bool {
        self.animate
    }

    pub fn use_texture(&self) -> bool {
        self.use_texture
    }

    pub fn distortion_amount(&self) -> f32 {
        self.distortion_amount
    }

    pub fn ripple_speed(&self) -> f32 {
        self.ripple_speed
    }

    pub fn chromatic_aberration(&self) -> f32 {
        self.chromatic_aberration
    }

    pub fn show_ring(&self) -> bool {
        self.show_ring
    }

    pub fn set_bpm(&mut self, bpm: u32) {
        self.bpm = clamp_bpm(bpm as i64);
    }

    pub fn set_animate(&mut self, animate: bool) {
        self.animate = animate;
    }

    pub fn set_use_texture(&mut self, use_texture: bool) {
        self.use_texture = use_texture;
    }

    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend_mode = mode;
    }

    /// Reads a parameter by name.
    pub fn get(&self, name: ParamName) -> SettingValue {
        match name {
            ParamName::Bpm => SettingValue::Int(self.bpm as i64),
            ParamName::PulseStrength => SettingValue::Float(self.pulse_strength),
            ParamName::RingRadius => SettingValue::Float(self.ring_radius),
            ParamName::RingSoftness => SettingValue::Float(self.ring_softness),
            ParamName::ColorA => SettingValue::Color(self.color_a),
            ParamName::ColorB => SettingValue::Color(self.color_b),
            ParamName::BlendMode => SettingValue::Blend(self.blend_mode),
            ParamName::BlendModeIndex => SettingValue::Int(self.blend_mode_index() as i64),
            ParamName::NoiseAmount => SettingValue::Float(self.noise_amount),
            ParamName::VignetteAmount => SettingValue::Float(self.vignette_amount),
            ParamName::Animate => SettingValue::Bool(self.animate),
            ParamName::UseTexture => SettingValue::Bool(self.use_texture),
            ParamName::DistortionAmount => SettingValue::Float(self.distortion_amount),
            ParamName::RippleSpeed => SettingValue::Float(self.ripple_speed),
            ParamName::ChromaticAberration => SettingValue::Float(self.chromatic_aberration),
            ParamName::ShowRing => SettingValue::Bool(self.show_ring),
        }
    }

    /// Writes a parameter by name. Numbers outside the declared range are
    /// clamped; values of the wrong kind are rejected without changing state.
    pub fn set(&mut self, name: ParamName, value: SettingValue) -> Result<()> {
        let mismatch = PulseRingError::TypeMismatch {
            name: name.as_str(),
            expected: name.kind().expected(),
        };

        match (name, value) {
            (ParamName::BlendModeIndex, _) => {
                return Err(PulseRingError::ReadOnlyParameter(name.as_str()))
            }
            (ParamName::Bpm, value) => {
                self.bpm = clamp_bpm(value.as_int().ok_or(mismatch)?);
            }
            (ParamName::ColorA, SettingValue::Color(color)) => self.color_a = color,
            (ParamName::ColorB, SettingValue::Color(color)) => self.color_b = color,
            (ParamName::BlendMode, SettingValue::Blend(mode)) => self.blend_mode = mode,
            (ParamName::Animate, SettingValue::Bool(flag)) => self.animate = flag,
            (ParamName::UseTexture, SettingValue::Bool(flag)) => self.use_texture = flag,
            (ParamName::ShowRing, SettingValue::Bool(flag)) => self.show_ring = flag,
            (name, value) if name.kind() == ParamKind::Float => {
                let clamped = clamp_to(name, value.as_float().ok_or(mismatch)?);
                *self.float_slot(name).ok_or_else(|| {
                    PulseRingError::msg(format!("no storage for `{name}`"))
                })? = clamped;
            }
            _ => return Err(mismatch),
        }

        Ok(())
    }

    /// Re-applies every declared range. Used after deserialising untrusted
    /// input, which bypasses [`Settings::set`].
    pub fn clamp_to_ranges(&mut self) {
        self.bpm = clamp_bpm(self.bpm as i64);
        for name in ParamName::ALL {
            if let Some(slot) = self.float_slot(name) {
                let value = if slot.is_finite() { *slot } else { 0.0 };
                *slot = clamp_to(name, value);
            }
        }
    }

    fn float_slot(&mut self, name: ParamName) -> Option<&mut f32> {
        match name {
            ParamName::PulseStrength => Some(&mut self.pulse_strength),
            ParamName::RingRadius => Some(&mut self.ring_radius),
            ParamName::RingSoftness => Some(&mut self.ring_softness),
            ParamName::NoiseAmount => Some(&mut self.noise_amount),
            ParamName::VignetteAmount => Some(&mut self.vignette_amount),
            ParamName::DistortionAmount => Some(&mut self.distortion_amount),
            ParamName::RippleSpeed => Some(&mut self.ripple_speed),
            ParamName::ChromaticAberration => Some(&mut self.chromatic_aberration),
            _ => None,
        }
    }
}

fn clamp_to(name: ParamName, value: f32) -> f32 {
    match name.range() {
        Some(range) => value.clamp(*range.start(), *range.end()),
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_range(settings: &Settings, name: ParamName) -> bool {
        let Some(range) = name.range() else {
            return true;
        };
        match settings.get(name) {
            SettingValue::Int(v) => range.contains(&(v as f32)),
            SettingValue::Float(v) => range.contains(&v),
            _ => true,
        }
    }

    #[test]
    fn defaults_lie_within_declared_ranges() {
        let settings = Settings::default();
        for name in ParamName::ALL {
            assert!(in_range(&settings, name), "{name} out of range");
        }
    }

    #[test]
    fn numeric_writes_are_clamped_not_rejected() {
        let mut settings = Settings::new();
        settings
            .set(ParamName::RingRadius, SettingValue::Float(4.0))
            .unwrap();
        settings
            .set(ParamName::NoiseAmount, SettingValue::Float(-1.0))
            .unwrap();
        settings.set(ParamName::Bpm, SettingValue::Int(999)).unwrap();

        assert_eq!(settings.ring_radius(), 0.6);
        assert_eq!(settings.noise_amount(), 0.0);
        assert_eq!(settings.bpm(), BPM_MAX);
    }

    #[test]
    fn integer_values_are_accepted_for_float_fields() {
        let mut settings = Settings::new();
        settings.set(ParamName::RippleSpeed, SettingValue::Int(3)).unwrap();
        assert_eq!(settings.ripple_speed(), 3.0);

        settings.set(ParamName::Bpm, SettingValue::Float(99.6)).unwrap();
        assert_eq!(settings.bpm(), 100);
    }

    #[test]
    fn wrong_kind_is_rejected_without_mutation() {
        let mut settings = Settings::new();
        let before = settings.clone();

        let err = settings
            .set(ParamName::Animate, SettingValue::Float(1.0))
            .unwrap_err();
        assert!(matches!(err, PulseRingError::TypeMismatch { name: "animate", .. }));

        let err = settings
            .set(ParamName::PulseStrength, SettingValue::Float(f32::NAN))
            .unwrap_err();
        assert!(matches!(err, PulseRingError::TypeMismatch { .. }));
        assert_eq!(settings, before);
    }

    #[test]
    fn blend_index_follows_blend_mode() {
        let mut settings = Settings::new();
        for mode in BlendMode::ALL {
            settings.set(ParamName::BlendMode, mode.into()).unwrap();
            assert_eq!(
                settings.get(ParamName::BlendModeIndex),
                SettingValue::Int(mode.index() as i64)
            );
        }
        assert_eq!(BlendMode::Normal.index(), 0);
        assert_eq!(BlendMode::Add.index(), 1);
        assert_eq!(BlendMode::Screen.index(), 2);
    }

    #[test]
    fn blend_index_is_read_only() {
        let mut settings = Settings::new();
        let err = settings
            .set(ParamName::BlendModeIndex, SettingValue::Int(0))
            .unwrap_err();
        assert!(matches!(err, PulseRingError::ReadOnlyParameter(_)));
        assert_eq!(settings.blend_mode(), BlendMode::Screen);
    }

    #[test]
    fn parses_hex_colors() {
        assert_eq!(Rgb::from_hex("#8b5cf6").unwrap(), Rgb::new(0x8b, 0x5c, 0xf6));
        assert_eq!(Rgb::from_hex("fff").unwrap(), Rgb::new(255, 255, 255));
        assert!(Rgb::from_hex("#12345").is_err());
        assert!(Rgb::from_hex("#zzzzzz").is_err());
        assert_eq!(Rgb::new(0x22, 0xd3, 0xee).to_hex(), "#22d3ee");
    }

    #[test]
    fn linear_conversion_hits_endpoints_and_midpoint() {
        assert_eq!(Rgb::new(0, 0, 0).to_linear(), [0.0, 0.0, 0.0]);
        assert_eq!(Rgb::new(255, 255, 255).to_linear(), [1.0, 1.0, 1.0]);
        let [mid, _, _] = Rgb::new(128, 0, 0).to_linear();
        assert!((mid - 0.2158).abs() < 1e-3);
    }

    #[test]
    fn parses_names_and_raw_values() {
        assert_eq!("ringRadius".parse::<ParamName>().unwrap(), ParamName::RingRadius);
        assert!(matches!(
            "ring_radius".parse::<ParamName>(),
            Err(PulseRingError::UnknownParameter(_))
        ));

        assert_eq!(
            ParamName::ShowRing.parse_value("off").unwrap(),
            SettingValue::Bool(false)
        );
        assert_eq!(
            ParamName::BlendMode.parse_value("Add").unwrap(),
            SettingValue::Blend(BlendMode::Add)
        );
        assert!(ParamName::PulseStrength.parse_value("loud").is_err());
    }

    #[test]
    fn deserialised_values_are_clamped_on_request() {
        let mut settings: Settings =
            serde_json::from_str(r##"{"bpm": 10, "ringSoftness": 3.0, "colorA": "#000000"}"##)
                .unwrap();
        settings.clamp_to_ranges();

        assert_eq!(settings.bpm(), BPM_MIN);
        assert_eq!(settings.ring_softness(), 0.25);
        assert_eq!(settings.color_a(), Rgb::new(0, 0, 0));
        assert_eq!(settings.pulse_strength(), 0.8);
    }
}
