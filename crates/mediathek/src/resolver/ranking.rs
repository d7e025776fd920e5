//! Total order used to pick the single best stream.

use std::cmp::Ordering;

use crate::media::{ContainerFormat, StreamDescriptor};

pub struct QualityRanking;

impl QualityRanking {
    /// Ascending "goodness": `Greater` means `a` is the better stream.
    ///
    /// Priority order:
    /// 1. quality tier
    /// 2. pixel height
    /// 3. container priority, only when both formats are in the table
    pub fn compare(a: &StreamDescriptor, b: &StreamDescriptor) -> Ordering {
        a.quality_tier
            .cmp(&b.quality_tier)
            .then_with(|| a.pixel_height.cmp(&b.pixel_height))
            .then_with(|| Self::compare_format(a.container_format, b.container_format))
    }

    /// Formats outside the table compare equal to everything.
    // TODO: rank unknown formats below the table once consumers agree on it;
    // today an mp4 and an flv stream of equal tier and height tie.
    fn compare_format(a: Option<ContainerFormat>, b: Option<ContainerFormat>) -> Ordering {
        match (a.and_then(Self::format_priority), b.and_then(Self::format_priority)) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => Ordering::Equal,
        }
    }

    fn format_priority(format: ContainerFormat) -> Option<u8> {
        match format {
            ContainerFormat::Mp4 => Some(1),
            ContainerFormat::ThreeGp => Some(0),
            _ => None,
        }
    }

    /// Best candidate; among equals the one that came last wins.
    pub fn best<I>(candidates: I) -> Option<StreamDescriptor>
    where
        I: IntoIterator<Item = StreamDescriptor>,
    {
        candidates.into_iter().max_by(Self::compare)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::QualityTier;

    fn descriptor(
        uri: &str,
        tier: QualityTier,
        height: u32,
        format: Option<ContainerFormat>,
    ) -> StreamDescriptor {
        StreamDescriptor::builder(uri, tier)
            .pixel_height(height)
            .container_format_opt(format)
            .build()
            .unwrap()
    }

    fn sample() -> Vec<StreamDescriptor> {
        let tiers = [QualityTier::Low, QualityTier::High, QualityTier::Hd];
        let heights = [0, 360, 720];
        let formats = [
            Some(ContainerFormat::Mp4),
            Some(ContainerFormat::ThreeGp),
            Some(ContainerFormat::Hls),
            None,
        ];
        let mut out = Vec::new();
        for (i, tier) in tiers.iter().enumerate() {
            for (j, height) in heights.iter().enumerate() {
                for (k, format) in formats.iter().enumerate() {
                    out.push(descriptor(
                        &format!("http://cdn.example/{i}{j}{k}"),
                        *tier,
                        *height,
                        *format,
                    ));
                }
            }
        }
        out
    }

    #[test]
    fn antisymmetric_on_all_pairs() {
        let all = sample();
        for a in &all {
            for b in &all {
                assert_eq!(
                    QualityRanking::compare(a, b),
                    QualityRanking::compare(b, a).reverse()
                );
            }
        }
    }

    #[test]
    fn transitive_within_the_format_table() {
        let all: Vec<_> = sample()
            .into_iter()
            .filter(|d| {
                matches!(
                    d.container_format,
                    Some(ContainerFormat::Mp4) | Some(ContainerFormat::ThreeGp)
                )
            })
            .collect();
        for a in &all {
            for b in &all {
                for c in &all {
                    if QualityRanking::compare(a, b) != Ordering::Less
                        && QualityRanking::compare(b, c) != Ordering::Less
                    {
                        assert_ne!(QualityRanking::compare(a, c), Ordering::Less);
                    }
                }
            }
        }
    }

    #[test]
    fn equal_only_on_true_ties_within_the_table() {
        let a = descriptor("http://a/1.mp4", QualityTier::High, 720, Some(ContainerFormat::Mp4));
        let b = descriptor("http://b/2.mp4", QualityTier::High, 720, Some(ContainerFormat::Mp4));
        assert_eq!(QualityRanking::compare(&a, &b), Ordering::Equal);

        let c = descriptor("http://c/3.3gp", QualityTier::High, 720, Some(ContainerFormat::ThreeGp));
        assert_eq!(QualityRanking::compare(&a, &c), Ordering::Greater);
    }

    #[test]
    fn highest_tier_wins_regardless_of_order() {
        let low = descriptor("rtmp://h/a/mp4:low", QualityTier::Low, 0, Some(ContainerFormat::Mp4));
        let medium = descriptor("rtmp://h/a/mp4:med", QualityTier::Medium, 0, Some(ContainerFormat::Mp4));
        let high = descriptor("rtmp://h/a/mp4:high", QualityTier::High, 0, Some(ContainerFormat::Mp4));

        let orders = [
            vec![low.clone(), medium.clone(), high.clone()],
            vec![high.clone(), low.clone(), medium.clone()],
            vec![medium.clone(), high.clone(), low.clone()],
        ];
        for order in orders {
            assert_eq!(QualityRanking::best(order).unwrap().uri, high.uri);
        }
    }

    #[test]
    fn height_breaks_tier_ties() {
        let sd = descriptor("http://a/sd.mp4", QualityTier::VeryHigh, 576, None);
        let hd = descriptor("http://a/hd.mp4", QualityTier::VeryHigh, 720, None);
        assert_eq!(QualityRanking::best([hd.clone(), sd]).unwrap(), hd);
    }

    #[test]
    fn mp4_beats_3gp_on_full_tie() {
        let mp4 = descriptor("http://a/v.mp4", QualityTier::High, 360, Some(ContainerFormat::Mp4));
        let three_gp = descriptor("http://a/v.3gp", QualityTier::High, 360, Some(ContainerFormat::ThreeGp));
        assert_eq!(QualityRanking::best([mp4.clone(), three_gp.clone()]).unwrap(), mp4);
        assert_eq!(QualityRanking::best([three_gp, mp4.clone()]).unwrap(), mp4);
    }

    #[test]
    fn out_of_table_formats_tie() {
        let mp4 = descriptor("http://a/v.mp4", QualityTier::High, 0, Some(ContainerFormat::Mp4));
        let hls = descriptor("http://a/v.m3u8", QualityTier::High, 0, Some(ContainerFormat::Hls));
        assert_eq!(QualityRanking::compare(&mp4, &hls), Ordering::Equal);
        assert_eq!(QualityRanking::best([mp4, hls.clone()]).unwrap(), hls);
    }

    #[test]
    fn empty_candidates_have_no_best() {
        assert!(QualityRanking::best(Vec::new()).is_none());
    }
}
