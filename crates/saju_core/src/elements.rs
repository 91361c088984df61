//! crates/saju_core/src/elements.rs
//!
//! Five-element (오행) aggregation over the eight symbols of a four-pillar
//! chart, plus the deterministic category scores derived from the balance.

use serde::Serialize;

use crate::domain::{Element, FourPillars};

/// Element of each heavenly stem (갑을 목, 병정 화, 무기 토, 경신 금, 임계 수).
const STEM_ELEMENTS: [Element; 10] = [
    Element::Wood,
    Element::Wood,
    Element::Fire,
    Element::Fire,
    Element::Earth,
    Element::Earth,
    Element::Metal,
    Element::Metal,
    Element::Water,
    Element::Water,
];

/// Element of each earthly branch (자 수, 축 토, 인묘 목, 진 토, 사오 화, ...).
const BRANCH_ELEMENTS: [Element; 12] = [
    Element::Water,
    Element::Earth,
    Element::Wood,
    Element::Wood,
    Element::Earth,
    Element::Fire,
    Element::Fire,
    Element::Earth,
    Element::Metal,
    Element::Metal,
    Element::Earth,
    Element::Water,
];

/// Occurrence counts of the five elements across the 8 symbols of a chart.
/// Invariant: the counts always sum to 8 (one stem and one branch per pillar).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ElementDistribution {
    pub wood: u8,
    pub fire: u8,
    pub earth: u8,
    pub metal: u8,
    pub water: u8,
}

impl ElementDistribution {
    pub fn count(&self, element: Element) -> u8 {
        match element {
            Element::Wood => self.wood,
            Element::Fire => self.fire,
            Element::Earth => self.earth,
            Element::Metal => self.metal,
            Element::Water => self.water,
        }
    }

    pub fn total(&self) -> u8 {
        self.wood + self.fire + self.earth + self.metal + self.water
    }

    /// The most frequent element; ties break by the fixed priority order
    /// 목 > 화 > 토 > 금 > 수.
    pub fn dominant(&self) -> Element {
        let mut best = Element::Wood;
        for element in Element::ALL {
            if self.count(element) > self.count(best) {
                best = element;
            }
        }
        best
    }

    /// The least frequent element, same tie-break order as `dominant`.
    pub fn weakest(&self) -> Element {
        let mut worst = Element::Wood;
        for element in Element::ALL {
            if self.count(element) < self.count(worst) {
                worst = element;
            }
        }
        worst
    }
}

/// Tallies the 4 stems and 4 branches of a chart into an element
/// distribution. Pure function, no side effects.
pub fn element_distribution(pillars: &FourPillars) -> ElementDistribution {
    let mut counts = [0u8; 5];
    for pillar in pillars.pillars() {
        for element in [
            STEM_ELEMENTS[pillar.stem as usize],
            BRANCH_ELEMENTS[pillar.branch as usize],
        ] {
            counts[element as usize] += 1;
        }
    }
    ElementDistribution {
        wood: counts[Element::Wood as usize],
        fire: counts[Element::Fire as usize],
        earth: counts[Element::Earth as usize],
        metal: counts[Element::Metal as usize],
        water: counts[Element::Water as usize],
    }
}

/// Category scores derived from the element balance. Deterministic for a
/// given chart, unlike the original product's random placeholder content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FortuneScores {
    pub overall: u8,
    pub love: u8,
    pub wealth: u8,
    pub career: u8,
    pub health: u8,
}

fn element_score(count: u8) -> u8 {
    (50 + u32::from(count) * 10).min(95) as u8
}

/// Scores: the overall score rewards a balanced chart, the category scores
/// track their associated element (연애 화, 재물 금, 직업 목, 건강 토).
pub fn fortune_scores(distribution: &ElementDistribution) -> FortuneScores {
    let max = Element::ALL
        .iter()
        .map(|e| distribution.count(*e))
        .max()
        .unwrap_or(0);
    let min = Element::ALL
        .iter()
        .map(|e| distribution.count(*e))
        .min()
        .unwrap_or(0);
    let spread = max - min;

    FortuneScores {
        overall: 95 - spread * 5,
        love: element_score(distribution.fire),
        wealth: element_score(distribution.metal),
        career: element_score(distribution.wood),
        health: element_score(distribution.earth),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BirthInput, Gender, Pillar};
    use crate::pillars::four_pillars;
    use chrono::{NaiveDate, NaiveTime};

    fn chart(pairs: [(u8, u8); 4]) -> FourPillars {
        FourPillars {
            year: Pillar::new(pairs[0].0, pairs[0].1),
            month: Pillar::new(pairs[1].0, pairs[1].1),
            day: Pillar::new(pairs[2].0, pairs[2].1),
            hour: Pillar::new(pairs[3].0, pairs[3].1),
            hour_assumed: false,
        }
    }

    #[test]
    fn counts_always_sum_to_eight() {
        for stem in 0..10u8 {
            for branch in 0..12u8 {
                let pillars = chart([
                    (stem, branch),
                    ((stem + 3) % 10, (branch + 5) % 12),
                    ((stem + 7) % 10, (branch + 9) % 12),
                    ((stem + 1) % 10, (branch + 11) % 12),
                ]);
                assert_eq!(element_distribution(&pillars).total(), 8);
            }
        }
    }

    #[test]
    fn distribution_for_a_known_birth_chart() {
        let input = BirthInput {
            name: "홍길동".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1990, 5, 15).unwrap(),
            birth_time: Some(NaiveTime::from_hms_opt(14, 30, 0).unwrap()),
            gender: Gender::Male,
            is_lunar: false,
        };
        // 경오 신사 경진 계미: 금3 화2 토2 수1 목0.
        let distribution = element_distribution(&four_pillars(&input).unwrap());
        assert_eq!(
            distribution,
            ElementDistribution {
                wood: 0,
                fire: 2,
                earth: 2,
                metal: 3,
                water: 1
            }
        );
        assert_eq!(distribution.dominant(), Element::Metal);
        assert_eq!(distribution.weakest(), Element::Wood);
    }

    #[test]
    fn ties_break_by_the_fixed_priority_order() {
        // 병오/병오 (화화) + 임자/임자 (수수): 화 4, 수 4, 나머지 0.
        let pillars = chart([(2, 6), (2, 6), (8, 0), (8, 0)]);
        let distribution = element_distribution(&pillars);
        assert_eq!(distribution.fire, 4);
        assert_eq!(distribution.water, 4);
        assert_eq!(distribution.dominant(), Element::Fire);
        assert_eq!(distribution.weakest(), Element::Wood);
    }

    #[test]
    fn scores_are_deterministic_and_bounded() {
        let pillars = chart([(0, 2), (0, 2), (0, 2), (0, 2)]);
        let distribution = element_distribution(&pillars);
        let first = fortune_scores(&distribution);
        let second = fortune_scores(&distribution);
        assert_eq!(first, second);
        for score in [first.overall, first.love, first.wealth, first.career, first.health] {
            assert!((40..=95).contains(&score));
        }
    }
}
