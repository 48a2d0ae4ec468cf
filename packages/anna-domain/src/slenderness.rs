//! Member slenderness checks for AS 4100-1998 compression members.

use std::fmt::Write;

use serde::Serialize;

/// Upper limit on `le/r` recommended for compression members.
pub const RECOMMENDED_MAX_RATIO: f64 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlendernessClass {
	Short,
	Intermediate,
	Slender,
}
impl SlendernessClass {
	pub fn from_ratio(ratio: f64) -> Self {
		if ratio <= 50.0 {
			Self::Short
		} else if ratio <= 100.0 {
			Self::Intermediate
		} else {
			Self::Slender
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			Self::Short => "Short column",
			Self::Intermediate => "Intermediate column",
			Self::Slender => "Slender column",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SlendernessError {
	#[error("Radius of gyration must be positive.")]
	NonPositiveRadius,
	#[error("Effective length must be zero or greater.")]
	NegativeLength,
	#[error("Inputs must be finite numbers.")]
	NonFinite,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SlendernessCheck {
	pub effective_length_mm: f64,
	pub radius_of_gyration_mm: f64,
	pub ratio: f64,
	pub class: SlendernessClass,
}
impl SlendernessCheck {
	pub fn exceeds_limit(&self) -> bool {
		self.ratio > RECOMMENDED_MAX_RATIO
	}

	/// Plain-text report handed back to the agent.
	pub fn render(&self) -> String {
		let mut out = String::new();
		let _ = writeln!(out, "SLENDERNESS CALCULATION (AS 4100-1998):");
		let _ = writeln!(out, "- Effective length (le): {:.1} mm", self.effective_length_mm);
		let _ = writeln!(out, "- Radius of gyration (r): {:.1} mm", self.radius_of_gyration_mm);
		let _ = writeln!(out, "- Slenderness ratio (le/r): {:.2}", self.ratio);
		let _ = writeln!(out, "- Classification: {}", self.class.label());
		let _ = writeln!(out);
		let _ = writeln!(out, "DESIGN NOTES:");
		let _ = writeln!(
			out,
			"- AS 4100-1998 recommends le/r <= {RECOMMENDED_MAX_RATIO:.0} for compression members"
		);

		if self.exceeds_limit() {
			let _ = writeln!(out, "- WARNING: le/r exceeds the recommended limit");
		}

		let _ = writeln!(out, "- Consider buckling effects for slender members");

		out
	}
}

pub fn slenderness(
	effective_length_mm: f64,
	radius_of_gyration_mm: f64,
) -> Result<SlendernessCheck, SlendernessError> {
	if !effective_length_mm.is_finite() || !radius_of_gyration_mm.is_finite() {
		return Err(SlendernessError::NonFinite);
	}
	if radius_of_gyration_mm <= 0.0 {
		return Err(SlendernessError::NonPositiveRadius);
	}
	if effective_length_mm < 0.0 {
		return Err(SlendernessError::NegativeLength);
	}

	let ratio = effective_length_mm / radius_of_gyration_mm;

	Ok(SlendernessCheck {
		effective_length_mm,
		radius_of_gyration_mm,
		ratio,
		class: SlendernessClass::from_ratio(ratio),
	})
}
