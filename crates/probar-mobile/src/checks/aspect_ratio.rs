//! Image aspect-ratio distortion.
//!
//! An image is distorted when its rendered box and its intrinsic size have
//! different proportions and CSS does not crop or letterbox it.

use super::{CheckOutcome, Evidence};
use crate::config::AspectRatioConfig;
use crate::dom::{DomSnapshot, ImageSnapshot, Occlusion, SnapshotScope};
use crate::driver::PageDriver;
use crate::result::AuditResult;

/// `object-fit` values that preserve the intrinsic proportions
pub const PRESERVING_OBJECT_FIT: [&str; 4] = ["contain", "cover", "none", "scale-down"];

/// Ratio between the rendered and intrinsic aspect ratios, in `(0, 1]`.
///
/// `None` when either size is unknown.
#[must_use]
pub fn divergence(image: &ImageSnapshot) -> Option<f64> {
    if image.width <= 0.0 || image.height <= 0.0 || image.natural_height <= 0.0 {
        return None;
    }

    let rendered = image.width / image.height;
    let natural = image.natural_width / image.natural_height;
    let (low, high) = if rendered < natural {
        (rendered, natural)
    } else {
        (natural, rendered)
    };

    if high > 0.0 {
        Some(low / high)
    } else {
        None
    }
}

/// Whether `src` points at a vector image
#[must_use]
pub fn is_vector_source(src: &str) -> bool {
    let path = src.split('#').next().unwrap_or_default();
    let path = path.split('?').next().unwrap_or_default();
    path.to_ascii_lowercase().ends_with(".svg")
}

fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Distorted images with their divergence, in document order
#[must_use]
pub fn find_distorted(snapshot: &DomSnapshot, config: &AspectRatioConfig) -> Vec<(usize, f64)> {
    let mut distorted = Vec::new();

    for (index, element) in snapshot.elements.iter().enumerate() {
        if element.tag != "img" {
            continue;
        }
        let Some(image) = &element.image else {
            continue;
        };
        if !image.has_src_attribute || image.effective_src().is_empty() {
            continue;
        }

        if snapshot
            .ancestors(index)
            .any(|(_, ancestor)| Occlusion::IMAGE.hides(ancestor))
        {
            continue;
        }

        let Some(ratio) = divergence(image) else {
            continue;
        };
        if ratio > config.tolerance {
            continue;
        }

        if is_vector_source(image.effective_src()) {
            continue;
        }

        if PRESERVING_OBJECT_FIT.contains(&element.object_fit.as_str()) {
            continue;
        }

        distorted.push((index, round_hundredths(ratio)));
    }

    distorted
}

/// Detect distorted images on the current page
pub async fn detect<D>(driver: &mut D, config: &AspectRatioConfig) -> AuditResult<CheckOutcome>
where
    D: PageDriver + ?Sized,
{
    let snapshot = DomSnapshot::capture(driver, SnapshotScope::Images).await?;
    let evidence = find_distorted(&snapshot, config)
        .into_iter()
        .filter_map(|(index, ratio)| {
            snapshot.get(index).map(|element| Evidence::Measured {
                snippet: element.outer_html.clone().unwrap_or_default(),
                ratio,
            })
        })
        .collect();

    Ok(CheckOutcome::from_evidence(evidence))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementSnapshot;
    use crate::mock::{MockDriver, MockPage};

    fn squashed(src: &str) -> ElementSnapshot {
        ElementSnapshot::new("img")
            .with_parent(DomSnapshot::BODY)
            .with_box(100.0, 50.0)
            .with_content("", format!("<img src=\"{src}\">"))
            .with_image(ImageSnapshot::new(src, (100.0, 50.0), (100.0, 100.0)))
    }

    fn detect_in(snapshot: &DomSnapshot) -> Vec<(usize, f64)> {
        find_distorted(snapshot, &AspectRatioConfig::default())
    }

    mod ratio_tests {
        use super::*;

        #[test]
        fn test_divergence_is_symmetric() {
            let wide = ImageSnapshot::new("a.png", (100.0, 50.0), (100.0, 100.0));
            let tall = ImageSnapshot::new("a.png", (50.0, 100.0), (100.0, 100.0));
            assert_eq!(divergence(&wide), Some(0.5));
            assert_eq!(divergence(&tall), Some(0.5));
        }

        #[test]
        fn test_unloaded_image_has_no_divergence() {
            let unloaded = ImageSnapshot::new("a.png", (100.0, 50.0), (0.0, 0.0));
            assert_eq!(divergence(&unloaded), None);
            let collapsed = ImageSnapshot::new("a.png", (0.0, 50.0), (100.0, 100.0));
            assert_eq!(divergence(&collapsed), None);
        }

        #[test]
        fn test_vector_source_detection() {
            assert!(is_vector_source("https://cdn.test/logo.svg"));
            assert!(is_vector_source("/img/LOGO.SVG?v=3#frag"));
            assert!(!is_vector_source("/img/photo.svg.png"));
            assert!(!is_vector_source("/img/photo.png?format=.svg"));
        }
    }

    mod detection_tests {
        use super::*;

        #[test]
        fn test_squashed_image_is_flagged() {
            let mut snapshot = DomSnapshot::with_document();
            let img = snapshot.push(squashed("photo.jpg"));
            assert_eq!(detect_in(&snapshot), vec![(img, 0.5)]);
        }

        #[test]
        fn test_object_fit_cover_is_exempt() {
            for fit in PRESERVING_OBJECT_FIT {
                let mut snapshot = DomSnapshot::with_document();
                snapshot.push(squashed("photo.jpg").with_object_fit(fit));
                assert!(detect_in(&snapshot).is_empty(), "{fit} should be exempt");
            }
        }

        #[test]
        fn test_svg_source_is_exempt() {
            let mut snapshot = DomSnapshot::with_document();
            snapshot.push(squashed("photo.svg"));
            assert!(detect_in(&snapshot).is_empty());
        }

        #[test]
        fn test_tolerance_boundary() {
            let mut snapshot = DomSnapshot::with_document();
            let mut within = squashed("a.png");
            within.image = Some(ImageSnapshot::new("a.png", (100.0, 100.5), (100.0, 100.0)));
            snapshot.push(within);
            let mut beyond = squashed("b.png");
            beyond.image = Some(ImageSnapshot::new("b.png", (100.0, 102.0), (100.0, 100.0)));
            let flagged = snapshot.push(beyond);

            assert_eq!(detect_in(&snapshot), vec![(flagged, 0.98)]);

            let loose = AspectRatioConfig { tolerance: 0.95 };
            assert!(find_distorted(&snapshot, &loose).is_empty());
        }

        #[test]
        fn test_hidden_ancestor_exempts_image() {
            let mut snapshot = DomSnapshot::with_document();
            let carousel = snapshot.push(
                ElementSnapshot::new("div")
                    .with_parent(DomSnapshot::BODY)
                    .with_display("none"),
            );
            snapshot.push(squashed("slide.jpg").with_parent(carousel));
            assert!(detect_in(&snapshot).is_empty());
        }

        #[test]
        fn test_fixed_ancestor_does_not_exempt_image() {
            let mut snapshot = DomSnapshot::with_document();
            let banner = snapshot.push(
                ElementSnapshot::new("div")
                    .with_parent(DomSnapshot::BODY)
                    .with_position("fixed")
                    .detached(),
            );
            let img = snapshot.push(squashed("banner.jpg").with_parent(banner));
            assert_eq!(detect_in(&snapshot), vec![(img, 0.5)]);
        }

        #[test]
        fn test_image_without_source_is_skipped() {
            let mut snapshot = DomSnapshot::with_document();
            let mut img = squashed("");
            if let Some(image) = img.image.as_mut() {
                image.src.clear();
                image.current_src.clear();
            }
            snapshot.push(img);
            assert!(detect_in(&snapshot).is_empty());
        }

        #[test]
        fn test_current_src_wins_over_src() {
            let mut snapshot = DomSnapshot::with_document();
            let mut img = squashed("photo.jpg");
            if let Some(image) = img.image.as_mut() {
                image.current_src = "photo@2x.svg".to_string();
            }
            snapshot.push(img);
            assert!(detect_in(&snapshot).is_empty());
        }
    }

    #[tokio::test]
    async fn test_detect_reports_markup_and_ratio() {
        let mut snapshot = DomSnapshot::with_document();
        snapshot.push(squashed("photo.jpg"));
        let mut driver = MockDriver::with_page(MockPage::new().with_snapshot(snapshot));

        let outcome = detect(&mut driver, &AspectRatioConfig::default())
            .await
            .unwrap();
        assert!(!outcome.success);
        assert_eq!(
            outcome.evidence,
            vec![Evidence::Measured {
                snippet: "<img src=\"photo.jpg\">".to_string(),
                ratio: 0.5,
            }]
        );
    }

    #[tokio::test]
    async fn test_detect_captures_images_only() {
        let mut snapshot = DomSnapshot::with_document();
        let article = snapshot.push(ElementSnapshot::new("article").with_parent(DomSnapshot::BODY));
        for _ in 0..3 {
            snapshot.push(
                ElementSnapshot::new("p")
                    .with_parent(article)
                    .with_font_size("10px")
                    .with_content("Hello", "<p>Hello</p>"),
            );
        }
        snapshot.push(squashed("photo.jpg").with_parent(article));
        let mut driver = MockDriver::with_page(MockPage::new().with_snapshot(snapshot));

        let outcome = detect(&mut driver, &AspectRatioConfig::default())
            .await
            .unwrap();
        assert_eq!(driver.history(), ["snapshot-images"]);
        assert_eq!(outcome.evidence.len(), 1);
        assert_eq!(outcome.evidence[0].snippet(), "<img src=\"photo.jpg\">");
    }
}
