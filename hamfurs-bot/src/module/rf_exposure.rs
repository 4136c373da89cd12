//! RF exposure estimate against the FCC maximum permissible exposure limits.

use std::f64::consts::PI;

pub const USAGE: &str =
    "Usage: /power_density [PEP Watts] [Antenna Gain] [Distance in m] [Frequency in MHz]";

/// Ground reflection factor applied by default.
const GROUND_REFLECTION: f64 = 0.64;
const FREE_SPACE: f64 = 0.25;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExposureError {
    #[error("Frequency too high")]
    FrequencyTooHigh,

    #[error("{0}")]
    InvalidInput(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExposureInput {
    pub watts: f64,
    pub gain_dbi: f64,
    pub distance_m: f64,
    pub frequency_mhz: f64,
}

/// Power density in mW/cm², field strength in V/m, distances in m.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExposureEstimate {
    pub power_density: f64,
    pub field_strength: f64,
    pub mpe_controlled: f64,
    pub mpe_uncontrolled: f64,
    pub dx_controlled: f64,
    pub dx_uncontrolled: f64,
}

impl ExposureEstimate {
    pub fn controlled_compliant(&self) -> bool {
        self.power_density < self.mpe_controlled
    }

    pub fn uncontrolled_compliant(&self) -> bool {
        self.power_density < self.mpe_uncontrolled
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Controlled and uncontrolled MPE limits in mW/cm² for a frequency in MHz.
fn mpe_limits(frequency: f64) -> Result<(f64, f64), ExposureError> {
    let limits = if frequency < 1.34 {
        (100.0, 100.0)
    } else if frequency < 3.0 {
        (100.0, 180.0 / frequency.powi(2))
    } else if frequency < 30.0 {
        (900.0 / frequency.powi(2), 180.0 / frequency.powi(2))
    } else if frequency < 300.0 {
        (1.0, 0.2)
    } else if frequency < 1500.0 {
        (frequency / 300.0, frequency / 1500.0)
    } else if frequency < 100_000.0 {
        (5.0, 1.0)
    } else {
        return Err(ExposureError::FrequencyTooHigh);
    };
    Ok(limits)
}

pub fn calculate(input: &ExposureInput, ground: bool) -> Result<ExposureEstimate, ExposureError> {
    if input.distance_m <= 0.0 {
        return Err(ExposureError::InvalidInput("Distance must be positive".into()));
    }
    if input.frequency_mhz <= 0.0 {
        return Err(ExposureError::InvalidInput("Frequency must be positive".into()));
    }
    if input.watts < 0.0 {
        return Err(ExposureError::InvalidInput("Power cannot be negative".into()));
    }

    let power_mw = 1000.0 * input.watts;
    let eirp = power_mw * 10f64.powf(input.gain_dbi / 10.0);
    let distance_cm = input.distance_m * 100.0;
    let (std_controlled, std_uncontrolled) = mpe_limits(input.frequency_mhz)?;
    let factor = if ground { GROUND_REFLECTION } else { FREE_SPACE };

    let power_density = factor * eirp / (PI * distance_cm.powi(2));
    let compliance_distance_cm = |limit: f64| (factor * eirp / (limit * PI)).sqrt();

    Ok(ExposureEstimate {
        power_density: round_to(power_density, 5),
        field_strength: round_to((power_density * 3770.0).sqrt(), 5),
        mpe_controlled: round_to(std_controlled, 2),
        mpe_uncontrolled: round_to(std_uncontrolled, 2),
        dx_controlled: round_to(compliance_distance_cm(std_controlled) / 100.0, 3),
        dx_uncontrolled: round_to(compliance_distance_cm(std_uncontrolled) / 100.0, 3),
    })
}

/// Parse the four numeric command arguments.
pub fn parse_args(args: &str) -> Result<ExposureInput, ExposureError> {
    let tokens: Vec<&str> = args.split_whitespace().collect();
    let [watts, gain, distance, frequency] = tokens.as_slice() else {
        return Err(ExposureError::InvalidInput(USAGE.to_string()));
    };
    let number = |raw: &str| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ExposureError::InvalidInput(format!("Error: '{}' is not a number", raw)))
    };
    Ok(ExposureInput {
        watts: number(watts)?,
        gain_dbi: number(gain)?,
        distance_m: number(distance)?,
        frequency_mhz: number(frequency)?,
    })
}

fn compliance(ok: bool) -> &'static str {
    if ok { "Compliant" } else { "Uncompliant" }
}

pub fn render(input: &ExposureInput, estimate: &ExposureEstimate) -> String {
    format!(
        "{} Watts into an antenna with gain {} dBi at distance {} m @ {} MHz:\n\n\
         *Estimated RF Power Density:* {} mW/cm²\n\
         *Field strength:* {} V/m\n\n\
         Maximum Permissible Exposure\n    \
         *Controlled:* {} (mW/cm²) _({})_\n    \
         *Uncontrolled:* {} (mW/cm²) _({})_\n\n\
         Minimum distance to compliance from antenna\n    \
         *Controlled:* {} m\n    \
         *Uncontrolled:* {} m",
        input.watts,
        input.gain_dbi,
        input.distance_m,
        input.frequency_mhz,
        estimate.power_density,
        estimate.field_strength,
        estimate.mpe_controlled,
        compliance(estimate.controlled_compliant()),
        estimate.mpe_uncontrolled,
        compliance(estimate.uncontrolled_compliant()),
        estimate.dx_controlled,
        estimate.dx_uncontrolled,
    )
}
