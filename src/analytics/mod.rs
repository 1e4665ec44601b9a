//! Performance dashboard. All figures are fixed sample data.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kpi {
    pub title: &'static str,
    pub value: &'static str,
    pub change: &'static str,
    pub positive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbRow {
    pub metric: &'static str,
    pub agency: u32,
    pub ai: u32,
}

impl AbRow {
    /// Relative uplift of the AI creative over agency creative, in percent.
    pub fn uplift_pct(&self) -> f64 {
        if self.agency == 0 {
            return 0.0;
        }
        (self.ai as f64 - self.agency as f64) / self.agency as f64 * 100.0
    }
}

pub const KPIS: [Kpi; 4] = [
    Kpi { title: "Total Revenue (Q4)", value: "£1.2M", change: "+12%", positive: true },
    Kpi { title: "Direct Booking Share", value: "64%", change: "+5%", positive: true },
    Kpi { title: "Cost Per Acquisition", value: "£14.20", change: "-8%", positive: false },
    Kpi { title: "Guest Sentiment", value: "4.8/5", change: "+0.2", positive: true },
];

pub const AB_TEST: [AbRow; 3] = [
    AbRow { metric: "Direct Clicks", agency: 4000, ai: 5200 },
    AbRow { metric: "Conversions", agency: 240, ai: 380 },
    AbRow { metric: "Engagement", agency: 2400, ai: 3100 },
];

pub const BOOKINGS_TREND: [(&str, u32); 7] = [
    ("Mon", 45),
    ("Tue", 52),
    ("Wed", 48),
    ("Thu", 61),
    ("Fri", 85),
    ("Sat", 95),
    ("Sun", 75),
];

/// Which side won the A/B test on every metric, if either did.
pub fn ab_winner() -> Option<&'static str> {
    if AB_TEST.iter().all(|r| r.ai > r.agency) {
        Some("AI")
    } else if AB_TEST.iter().all(|r| r.agency > r.ai) {
        Some("Agency")
    } else {
        None
    }
}

/// Text bar scaled so that `max` fills `width` cells.
pub fn bar(value: u32, max: u32, width: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let cells = ((value as f64 / max as f64) * width as f64).round() as usize;
    "█".repeat(cells.min(width))
}
