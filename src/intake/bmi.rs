//! Body-mass index derivation and classification.

use std::fmt;

/// WHO adult BMI category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BmiCategory {
    Underweight,
    NormalWeight,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn label(&self) -> &'static str {
        match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::NormalWeight => "Normal weight",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obese => "Obese",
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// `weight / (height_m)^2` rounded to one decimal.
///
/// `None` unless both inputs are positive and finite.
pub fn compute_bmi(height_cm: f64, weight_kg: f64) -> Option<f64> {
    if !(height_cm.is_finite() && weight_kg.is_finite()) || height_cm <= 0.0 || weight_kg <= 0.0 {
        return None;
    }
    let height_m = height_cm / 100.0;
    let bmi = weight_kg / (height_m * height_m);
    bmi.is_finite().then(|| round_one_decimal(bmi))
}

/// Classify a BMI; `None` for an absent or non-finite value.
pub fn classify_bmi(bmi: Option<f64>) -> Option<BmiCategory> {
    let bmi = bmi.filter(|b| b.is_finite())?;
    Some(if bmi < 18.5 {
        BmiCategory::Underweight
    } else if bmi < 25.0 {
        BmiCategory::NormalWeight
    } else if bmi < 30.0 {
        BmiCategory::Overweight
    } else {
        BmiCategory::Obese
    })
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_bmi() {
        assert_eq!(compute_bmi(165.0, 70.0), Some(25.7));
        assert_eq!(compute_bmi(180.0, 81.0), Some(25.0));
        assert_eq!(compute_bmi(150.0, 45.0), Some(20.0));
    }

    #[test]
    fn test_compute_bmi_rejects_non_positive() {
        assert_eq!(compute_bmi(0.0, 70.0), None);
        assert_eq!(compute_bmi(-170.0, 70.0), None);
        assert_eq!(compute_bmi(170.0, 0.0), None);
        assert_eq!(compute_bmi(f64::NAN, 70.0), None);
    }

    #[test]
    fn test_classify_boundaries() {
        let cases = [
            (18.4, BmiCategory::Underweight),
            (18.5, BmiCategory::NormalWeight),
            (24.99, BmiCategory::NormalWeight),
            (25.0, BmiCategory::Overweight),
            (29.99, BmiCategory::Overweight),
            (30.0, BmiCategory::Obese),
        ];
        for (bmi, expected) in cases {
            assert_eq!(classify_bmi(Some(bmi)), Some(expected), "bmi {}", bmi);
        }
    }

    #[test]
    fn test_classify_absent() {
        assert_eq!(classify_bmi(None), None);
        assert_eq!(classify_bmi(Some(f64::NAN)), None);
        assert_eq!(BmiCategory::NormalWeight.to_string(), "Normal weight");
    }
}
