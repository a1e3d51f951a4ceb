use serde::Serialize;

/// Per-trip pricing knobs, loaded from the environment at startup.
#[derive(Debug, Clone)]
pub struct FareRates {
    pub base: f64,
    pub per_km: f64,
    pub per_minute: f64,
    /// Applied to the pre-tax subtotal.
    pub tax_rate: f64,
    /// Used to turn distance into an estimated travel time.
    pub avg_speed_kmh: f64,
}

/// Itemized fare. The components always sum to `total`.
#[derive(Debug, Clone, Serialize)]
pub struct FareBreakdown {
    pub base: f64,
    pub distance: f64,
    pub time: f64,
    pub tax: f64,
    pub total: f64,
}

pub fn estimate_fare(rates: &FareRates, distance_km: f64) -> FareBreakdown {
    let base = round_cents(rates.base);
    let distance = round_cents(rates.per_km * distance_km);

    let minutes = distance_km / rates.avg_speed_kmh * 60.0;
    let time = round_cents(rates.per_minute * minutes);

    let tax = round_cents((base + distance + time) * rates.tax_rate);

    FareBreakdown {
        base,
        distance,
        time,
        tax,
        total: round_cents(base + distance + time + tax),
    }
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rates() -> FareRates {
        FareRates {
            base: 2.50,
            per_km: 1.20,
            per_minute: 0.35,
            tax_rate: 0.10,
            avg_speed_kmh: 40.0,
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn ten_km_trip() {
        let fare = estimate_fare(&rates(), 10.0);

        assert_close(fare.base, 2.50);
        assert_close(fare.distance, 12.00);
        // 10 km at 40 km/h is 15 minutes
        assert_close(fare.time, 5.25);
        assert_close(fare.tax, 1.98);
        assert_close(fare.total, 21.73);
    }

    #[test]
    fn components_sum_to_total() {
        for km in [0.0, 1.3, 7.77, 25.0, 120.5] {
            let fare = estimate_fare(&rates(), km);
            assert_close(fare.base + fare.distance + fare.time + fare.tax, fare.total);
        }
    }

    #[test]
    fn zero_distance_still_charges_base_and_tax() {
        let fare = estimate_fare(&rates(), 0.0);
        assert_close(fare.distance, 0.0);
        assert_close(fare.time, 0.0);
        assert_close(fare.total, 2.75);
    }
}
