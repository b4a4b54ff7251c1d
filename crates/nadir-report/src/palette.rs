//! Response-category marker styles shared by both charts.

use plotters::style::RGBColor;

use nadir_common::ResponseCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerShape {
    Circle,
    Triangle,
    Square,
    Cross,
}

#[derive(Debug, Clone, Copy)]
pub struct MarkerStyle {
    pub colour: RGBColor,
    pub shape: MarkerShape,
}

pub const BASELINE_COLOUR: RGBColor = RGBColor(40, 40, 40);
pub const MARKER_SIZE: i32 = 5;

pub const fn style_for(category: ResponseCategory) -> MarkerStyle {
    match category {
        ResponseCategory::ProgressiveDisease => MarkerStyle { colour: RGBColor(214, 39, 40),  shape: MarkerShape::Cross },
        ResponseCategory::CompleteResponse   => MarkerStyle { colour: RGBColor(31, 119, 180), shape: MarkerShape::Square },
        ResponseCategory::PartialResponse    => MarkerStyle { colour: RGBColor(44, 160, 44),  shape: MarkerShape::Triangle },
        ResponseCategory::StableDisease      => MarkerStyle { colour: RGBColor(255, 127, 14), shape: MarkerShape::Circle },
        ResponseCategory::NonCrNonPd         => MarkerStyle { colour: RGBColor(127, 127, 127), shape: MarkerShape::Circle },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_are_distinguishable() {
        let styles: Vec<_> = ResponseCategory::ALL.iter().map(|c| style_for(*c)).collect();
        for (i, a) in styles.iter().enumerate() {
            for b in &styles[i + 1..] {
                let same_colour = (a.colour.0, a.colour.1, a.colour.2) == (b.colour.0, b.colour.1, b.colour.2);
                assert!(!(same_colour && a.shape == b.shape));
            }
        }
    }
}
