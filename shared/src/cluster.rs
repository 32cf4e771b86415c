/// Visual size class for a marker cluster, chosen from its child count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterIconTier {
    One,
    Two,
    Three,
    Four,
    Five,
}

impl ClusterIconTier {
    pub const fn for_count(count: usize) -> Self {
        match count {
            0..10 => Self::One,
            10..25 => Self::Two,
            25..50 => Self::Three,
            50..100 => Self::Four,
            _ => Self::Five,
        }
    }

    pub const fn class_name(self) -> &'static str {
        match self {
            Self::One => "cluster-icon-one",
            Self::Two => "cluster-icon-two",
            Self::Three => "cluster-icon-three",
            Self::Four => "cluster-icon-four",
            Self::Five => "cluster-icon-five",
        }
    }

    /// Square icon edge in CSS pixels.
    pub const fn size_px(self) -> u32 {
        match self {
            Self::One => 53,
            Self::Two => 55,
            Self::Three => 65,
            Self::Four => 78,
            Self::Five => 90,
        }
    }

    /// Inner HTML for the cluster's div icon.
    pub fn label_html(count: usize) -> String {
        format!(r#"<span style="margin:-0.1rem; display: block">{count}</span>"#)
    }
}
