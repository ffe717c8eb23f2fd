use std::{fmt, str::FromStr};

use serde::Serialize;

use crate::{
    error::{BookingError, Result},
    models::Discount,
};

/// The salon's fixed service menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    CutAndColor,
    WashAndCut,
    ColorOnly,
}

impl ServiceType {
    pub const ALL: [ServiceType; 3] = [
        ServiceType::CutAndColor,
        ServiceType::WashAndCut,
        ServiceType::ColorOnly,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            ServiceType::CutAndColor => "cutandcolor",
            ServiceType::WashAndCut => "washandcut",
            ServiceType::ColorOnly => "coloronly",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ServiceType::CutAndColor => "Cut and Color",
            ServiceType::WashAndCut => "Wash and Cut",
            ServiceType::ColorOnly => "Color Only",
        }
    }

    pub fn base_price(self) -> f64 {
        match self {
            ServiceType::CutAndColor => 80.0,
            ServiceType::WashAndCut => 65.0,
            ServiceType::ColorOnly => 45.0,
        }
    }

    pub fn parse(keyword: &str) -> Result<Self> {
        let keyword = keyword.trim();
        Self::ALL
            .into_iter()
            .find(|service| service.keyword() == keyword)
            .ok_or_else(|| BookingError::UnknownService(keyword.to_string()))
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What to do when a discount exceeds the base price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NegativePricePolicy {
    #[default]
    Allow,
    FloorAtZero,
}

impl FromStr for NegativePricePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "allow" => Ok(Self::Allow),
            "floor" | "floor-at-zero" => Ok(Self::FloorAtZero),
            other => Err(format!("expected allow or floor, got {other:?}")),
        }
    }
}

/// Base price of `service` minus the amounts of every discount named `discount_name`.
///
/// An unknown discount name applies nothing.
pub fn compute_price(
    service: &str,
    discount_name: Option<&str>,
    discounts: &[Discount],
    policy: NegativePricePolicy,
) -> Result<f64> {
    let base = ServiceType::parse(service)?.base_price();
    let reduction: f64 = match discount_name.map(str::trim) {
        Some(name) => discounts
            .iter()
            .filter(|discount| discount.name == name)
            .map(|discount| discount.amount)
            .sum(),
        None => 0.0,
    };

    let price = base - reduction;
    Ok(match policy {
        NegativePricePolicy::Allow => price,
        NegativePricePolicy::FloorAtZero => price.max(0.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALLOW: NegativePricePolicy = NegativePricePolicy::Allow;

    fn discount(name: &str, amount: f64) -> Discount {
        Discount {
            id: format!("id-{name}"),
            name: name.to_string(),
            amount,
        }
    }

    #[test]
    fn welcome_discount_on_color() {
        let discounts = vec![discount("welcome", 20.0), discount("take10", 10.0)];
        let price = compute_price("coloronly", Some("welcome"), &discounts, ALLOW);
        assert_eq!(price.unwrap(), 25.0);
    }

    #[test]
    fn unknown_discount_is_ignored() {
        let discounts = vec![discount("welcome", 20.0)];
        let price = compute_price("washandcut", Some("nonexistent"), &discounts, ALLOW);
        assert_eq!(price.unwrap(), 65.0);
        assert_eq!(compute_price("cutandcolor", None, &discounts, ALLOW).unwrap(), 80.0);
    }

    #[test]
    fn unknown_service_fails() {
        let err = compute_price("perm", None, &[], ALLOW).unwrap_err();
        assert!(matches!(err, BookingError::UnknownService(name) if name == "perm"));
    }

    #[test]
    fn every_discount_with_the_name_applies() {
        let discounts = vec![
            discount("spring", 5.0),
            discount("welcome", 20.0),
            discount("spring", 25.0),
        ];
        let price = compute_price("coloronly", Some("spring"), &discounts, ALLOW);
        assert_eq!(price.unwrap(), 15.0);
    }

    #[test]
    fn negative_price_policy() {
        // Discounts from outside the validated range can still exist in old data.
        let discounts = vec![discount("staff", 60.0)];
        let floor = NegativePricePolicy::FloorAtZero;
        assert_eq!(compute_price("coloronly", Some("staff"), &discounts, ALLOW).unwrap(), -15.0);
        assert_eq!(compute_price("coloronly", Some("staff"), &discounts, floor).unwrap(), 0.0);
    }

    #[test]
    fn labels_and_policy_parsing() {
        assert_eq!(ServiceType::parse("cutandcolor").unwrap().label(), "Cut and Color");
        assert_eq!(
            "FLOOR".parse::<NegativePricePolicy>().unwrap(),
            NegativePricePolicy::FloorAtZero
        );
        assert!("never".parse::<NegativePricePolicy>().is_err());
    }
}
