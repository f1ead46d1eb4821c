//! Venn-style consensus map
//!
//! Experts are drawn as equal circles on a regular polygon around the canvas
//! center. Arguments with high cross-expert agreement become consensus points
//! placed in the region of the experts that endorse them; arguments with low
//! agreement become disagreement points placed between the proposer and the
//! experts who reject it. Arguments in the middle band are not drawn.
//!
//! Placement jitter is random. Pass a seeded RNG to
//! [`ConsensusLayoutEngine::layout_with_rng`] for reproducible coordinates.

use rand::Rng;
use serde::Serialize;
use std::f64::consts::PI;

use colloquy_core::{Argument, ArgumentId, ClaimKind, ExpertId, MIN_EXPERTS};

use crate::geometry::Point;
use crate::hit_index::{HitIndexConfig, PointIndex};

/// Expert circle colours, cycled by roster position
pub const EXPERT_COLORS: [&str; 4] = ["#F39C12", "#7CB342", "#E74C3C", "#5DADE2"];

const HIGHLIGHT_FILL: &str = "#F39C12";
const HIGHLIGHT_STROKE: &str = "#1A2B47";
const POINT_STROKE: &str = "#FFFFFF";

fn claim_fill(kind: Option<ClaimKind>) -> &'static str {
    match kind {
        Some(ClaimKind::Factual) => "#4CAF50",
        Some(ClaimKind::Interpretive) => "#2196F3",
        Some(ClaimKind::Predictive) => "#9C27B0",
        Some(ClaimKind::Normative) => "#FF9800",
        None => "#757575",
    }
}

/// Tunables for [`ConsensusLayoutEngine`]
#[derive(Debug, Clone, PartialEq)]
pub struct ConsensusConfig {
    pub width: f64,
    pub height: f64,
    /// Radius of every expert circle
    pub circle_radius: f64,
    /// Polygon radius for a two-expert roster
    pub pair_spread: f64,
    /// Polygon radius for three or more experts
    pub group_spread: f64,
    /// Upper bound on the polygon radius
    pub max_spread: f64,
    /// Agreement strictly above this is consensus
    pub consensus_threshold: f64,
    /// Agreement strictly below this is disagreement
    pub disagreement_threshold: f64,
    /// Jitter around a single expert, the full-consensus center or a contested midpoint
    pub near_jitter: f64,
    /// Jitter around a pairwise intersection anchor
    pub pair_jitter: f64,
    /// Jitter for points with no specific region
    pub wide_jitter: f64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            circle_radius: 120.0,
            pair_spread: 120.0,
            group_spread: 150.0,
            max_spread: 180.0,
            consensus_threshold: 0.7,
            disagreement_threshold: 0.4,
            near_jitter: 20.0,
            pair_jitter: 15.0,
            wide_jitter: 30.0,
        }
    }
}

impl ConsensusConfig {
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    fn spread(&self, expert_count: usize) -> f64 {
        let base = if expert_count == 2 {
            self.pair_spread
        } else {
            self.group_spread
        };
        base.min(self.max_spread)
    }
}

/// One expert's circle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpertRegion {
    pub expert_id: ExpertId,
    pub center: Point,
    pub radius: f64,
    pub color: &'static str,
}

/// Reference point for arguments endorsed by a specific group of experts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntersectionAnchor {
    pub experts: Vec<ExpertId>,
    pub point: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PointClass {
    Consensus,
    Disagreement,
}

/// The region a point was placed in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Endorsed by every expert: canvas center
    AllExperts,
    /// Endorsed by one expert: that expert's circle center
    SingleExpert(ExpertId),
    /// Endorsed by exactly two experts: their pairwise anchor
    Pair(ExpertId, ExpertId),
    /// Proposer and opposers known: between them
    Contested {
        proposer: ExpertId,
        opposers: Vec<ExpertId>,
    },
    /// Proposer known, nobody recorded against
    Proposer(ExpertId),
    /// No matching region: wide jitter around the canvas center
    Diffuse,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointStyle {
    pub fill: &'static str,
    pub stroke: &'static str,
    pub stroke_width: f64,
}

impl PointStyle {
    fn for_point(kind: Option<ClaimKind>, highlighted: bool) -> Self {
        if highlighted {
            Self {
                fill: HIGHLIGHT_FILL,
                stroke: HIGHLIGHT_STROKE,
                stroke_width: 3.0,
            }
        } else {
            Self {
                fill: claim_fill(kind),
                stroke: POINT_STROKE,
                stroke_width: 1.0,
            }
        }
    }
}

/// A consensus or disagreement marker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    pub argument_id: ArgumentId,
    pub class: PointClass,
    pub placement: Placement,
    /// Region reference the jitter was applied around
    pub anchor: Point,
    /// Largest allowed distance from `anchor`
    pub jitter: f64,
    pub position: Point,
    /// `agreement` for consensus, `1 - agreement` for disagreement
    pub strength: f64,
    pub radius: f64,
    pub claim_kind: Option<ClaimKind>,
    pub highlighted: bool,
    pub style: PointStyle,
}

/// A computed consensus map
#[derive(Debug, Clone, Serialize)]
pub struct ConsensusLayout {
    pub center: Point,
    pub experts: Vec<ExpertRegion>,
    pub anchors: Vec<IntersectionAnchor>,
    /// Consensus points first, then disagreement points (draw order)
    pub points: Vec<MapPoint>,
    #[serde(skip)]
    index: PointIndex<usize>,
}

impl ConsensusLayout {
    pub fn point(&self, argument_id: &str) -> Option<&MapPoint> {
        self.points.iter().find(|p| p.argument_id == argument_id)
    }

    pub fn region(&self, expert_id: &str) -> Option<&ExpertRegion> {
        self.experts.iter().find(|r| r.expert_id == expert_id)
    }

    pub fn consensus_points(&self) -> impl Iterator<Item = &MapPoint> {
        self.points.iter().filter(|p| p.class == PointClass::Consensus)
    }

    pub fn disagreement_points(&self) -> impl Iterator<Item = &MapPoint> {
        self.points
            .iter()
            .filter(|p| p.class == PointClass::Disagreement)
    }

    /// Topmost point whose circle contains the coordinate
    pub fn hit_test(&self, x: f64, y: f64) -> Option<&MapPoint> {
        self.index.hit_test(x, y).and_then(|&i| self.points.get(i))
    }

    /// Restyle the given point as highlighted and every other point as normal.
    ///
    /// Positions are untouched. Returns false, leaving styles unchanged, when
    /// the id is not on the map.
    pub fn highlight(&mut self, argument_id: Option<&str>) -> bool {
        if let Some(id) = argument_id {
            if self.point(id).is_none() {
                return false;
            }
        }
        for point in &mut self.points {
            point.highlighted = Some(point.argument_id.as_str()) == argument_id;
            point.style = PointStyle::for_point(point.claim_kind, point.highlighted);
        }
        true
    }

    pub fn highlighted(&self) -> Option<&MapPoint> {
        self.points.iter().find(|p| p.highlighted)
    }
}

/// Result of a consensus layout
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConsensusMap {
    /// Fewer than two experts; nothing is laid out
    Insufficient { expert_count: usize },
    Layout(ConsensusLayout),
}

impl ConsensusMap {
    pub fn layout(&self) -> Option<&ConsensusLayout> {
        match self {
            Self::Layout(layout) => Some(layout),
            Self::Insufficient { .. } => None,
        }
    }

    pub fn layout_mut(&mut self) -> Option<&mut ConsensusLayout> {
        match self {
            Self::Layout(layout) => Some(layout),
            Self::Insufficient { .. } => None,
        }
    }

    pub fn is_insufficient(&self) -> bool {
        matches!(self, Self::Insufficient { .. })
    }
}

/// Computes [`ConsensusMap`]s
#[derive(Debug, Clone, Default)]
pub struct ConsensusLayoutEngine {
    config: ConsensusConfig,
}

impl ConsensusLayoutEngine {
    pub fn new(config: ConsensusConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    /// Lay out with the thread-local RNG
    pub fn layout<'a>(
        &self,
        experts: &[ExpertId],
        arguments: impl IntoIterator<Item = &'a Argument>,
    ) -> ConsensusMap {
        self.layout_with_rng(experts, arguments, &mut rand::rng())
    }

    /// Lay out with a caller-supplied RNG.
    ///
    /// Evidence nodes are ignored. Endorsements and rejections by experts
    /// outside `experts` are ignored.
    pub fn layout_with_rng<'a, R: Rng + ?Sized>(
        &self,
        experts: &[ExpertId],
        arguments: impl IntoIterator<Item = &'a Argument>,
        rng: &mut R,
    ) -> ConsensusMap {
        if experts.len() < MIN_EXPERTS {
            tracing::debug!(expert_count = experts.len(), "Too few experts for consensus map");
            return ConsensusMap::Insufficient {
                expert_count: experts.len(),
            };
        }

        let cfg = &self.config;
        let center = cfg.center();
        let spread = cfg.spread(experts.len());
        let n = experts.len() as f64;

        let regions: Vec<ExpertRegion> = experts
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let angle = 2.0 * PI * i as f64 / n - PI / 2.0;
                ExpertRegion {
                    expert_id: id.clone(),
                    center: Point::new(center.x + spread * angle.cos(), center.y + spread * angle.sin()),
                    radius: cfg.circle_radius,
                    color: EXPERT_COLORS[i % EXPERT_COLORS.len()],
                }
            })
            .collect();

        let mut anchors = Vec::new();
        for (i, a) in regions.iter().enumerate() {
            for b in &regions[i + 1..] {
                anchors.push(IntersectionAnchor {
                    experts: vec![a.expert_id.clone(), b.expert_id.clone()],
                    point: a.center.midpoint(b.center),
                });
            }
        }
        if regions.len() >= 3 {
            anchors.push(IntersectionAnchor {
                experts: experts.to_vec(),
                point: center,
            });
        }

        let placer = Placer {
            config: cfg,
            center,
            regions: &regions,
            anchors: &anchors,
        };

        let mut consensus = Vec::new();
        let mut disagreement = Vec::new();
        for argument in arguments.into_iter().filter(|a| !a.is_evidence()) {
            let agreement = argument.agreement_level;
            if agreement > cfg.consensus_threshold {
                consensus.push(placer.consensus_point(argument, rng));
            } else if agreement < cfg.disagreement_threshold {
                disagreement.push(placer.disagreement_point(argument, rng));
            }
        }

        let mut points = consensus;
        points.append(&mut disagreement);

        let mut index = PointIndex::new(HitIndexConfig::default());
        for (i, point) in points.iter().enumerate() {
            index.insert(i, point.position, point.radius);
        }

        tracing::debug!(
            experts = regions.len(),
            points = points.len(),
            "Consensus map laid out"
        );

        ConsensusMap::Layout(ConsensusLayout {
            center,
            experts: regions,
            anchors,
            points,
            index,
        })
    }
}

struct Placer<'a> {
    config: &'a ConsensusConfig,
    center: Point,
    regions: &'a [ExpertRegion],
    anchors: &'a [IntersectionAnchor],
}

impl Placer<'_> {
    fn region(&self, id: &str) -> Option<&ExpertRegion> {
        self.regions.iter().find(|r| r.expert_id == id)
    }

    /// Roster members in `ids`, in roster order
    fn on_roster(&self, keep: impl Fn(&str) -> bool) -> Vec<&ExpertRegion> {
        self.regions.iter().filter(|r| keep(&r.expert_id)).collect()
    }

    fn consensus_point<R: Rng + ?Sized>(&self, argument: &Argument, rng: &mut R) -> MapPoint {
        let supporters = self.on_roster(|id| argument.supported_by.contains(id));
        let cfg = self.config;

        let (placement, anchor, jitter) = match supporters.as_slice() {
            s if s.len() == self.regions.len() => (Placement::AllExperts, self.center, cfg.near_jitter),
            [one] => (
                Placement::SingleExpert(one.expert_id.clone()),
                one.center,
                cfg.near_jitter,
            ),
            [a, b] => match self.pair_anchor(&a.expert_id, &b.expert_id) {
                Some(point) => (
                    Placement::Pair(a.expert_id.clone(), b.expert_id.clone()),
                    point,
                    cfg.pair_jitter,
                ),
                None => (Placement::Diffuse, self.center, cfg.wide_jitter),
            },
            _ => (Placement::Diffuse, self.center, cfg.wide_jitter),
        };

        self.point(argument, PointClass::Consensus, argument.agreement_level, placement, anchor, jitter, rng)
    }

    fn disagreement_point<R: Rng + ?Sized>(&self, argument: &Argument, rng: &mut R) -> MapPoint {
        let cfg = self.config;
        let proposer = argument.speaker_id.as_deref().and_then(|id| self.region(id));
        let opposers = self.on_roster(|id| {
            argument.opposed_by.contains(id) && argument.speaker_id.as_deref() != Some(id)
        });

        let (placement, anchor, jitter) = match proposer {
            Some(p) if !opposers.is_empty() => {
                let centers: Vec<Point> = opposers.iter().map(|r| r.center).collect();
                let against = Point::centroid(&centers).unwrap_or(self.center);
                (
                    Placement::Contested {
                        proposer: p.expert_id.clone(),
                        opposers: opposers.iter().map(|r| r.expert_id.clone()).collect(),
                    },
                    p.center.midpoint(against),
                    cfg.near_jitter,
                )
            }
            Some(p) => (Placement::Proposer(p.expert_id.clone()), p.center, cfg.near_jitter),
            None => (Placement::Diffuse, self.center, cfg.wide_jitter),
        };

        self.point(
            argument,
            PointClass::Disagreement,
            1.0 - argument.agreement_level,
            placement,
            anchor,
            jitter,
            rng,
        )
    }

    fn pair_anchor(&self, a: &str, b: &str) -> Option<Point> {
        self.anchors
            .iter()
            .find(|anchor| {
                anchor.experts.len() == 2
                    && anchor.experts.iter().any(|e| e == a)
                    && anchor.experts.iter().any(|e| e == b)
            })
            .map(|anchor| anchor.point)
    }

    #[allow(clippy::too_many_arguments)]
    fn point<R: Rng + ?Sized>(
        &self,
        argument: &Argument,
        class: PointClass,
        strength: f64,
        placement: Placement,
        anchor: Point,
        jitter: f64,
        rng: &mut R,
    ) -> MapPoint {
        // Uniform over the disc so the offset never exceeds `jitter`
        let r = jitter * rng.random::<f64>().sqrt();
        let theta = 2.0 * PI * rng.random::<f64>();
        MapPoint {
            argument_id: argument.id.clone(),
            class,
            placement,
            anchor,
            jitter,
            position: Point::new(anchor.x + r * theta.cos(), anchor.y + r * theta.sin()),
            strength,
            radius: 8.0 + 4.0 * strength,
            claim_kind: argument.claim_kind,
            highlighted: false,
            style: PointStyle::for_point(argument.claim_kind, false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colloquy_core::ArgumentKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ids(list: &[&str]) -> Vec<ExpertId> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_first_expert_at_top() {
        let map = ConsensusLayoutEngine::default().layout(&ids(&["a", "b", "c"]), &Vec::<Argument>::new());
        let layout = map.layout().unwrap();
        let top = layout.region("a").unwrap();
        assert!((top.center.x - 400.0).abs() < 1e-9);
        assert!((top.center.y - 150.0).abs() < 1e-9);
        assert_eq!(layout.anchors.len(), 4);
        assert_eq!(layout.experts[1].color, "#7CB342");
    }

    #[test]
    fn test_two_experts_use_pair_spread() {
        let map = ConsensusLayoutEngine::default().layout(&ids(&["a", "b"]), &Vec::<Argument>::new());
        let layout = map.layout().unwrap();
        assert!((layout.experts[0].center.distance(layout.center) - 120.0).abs() < 1e-9);
        assert_eq!(layout.anchors.len(), 1);
    }

    #[test]
    fn test_dead_zone_excluded() {
        let args = vec![
            Argument::new("mid", ArgumentKind::Claim, "Mid").with_agreement(0.55),
            Argument::new("edge", ArgumentKind::Claim, "Edge").with_agreement(0.7),
            Argument::new("low", ArgumentKind::Claim, "Low").with_agreement(0.4),
        ];
        let map = ConsensusLayoutEngine::default().layout(&ids(&["a", "b"]), &args);
        assert!(map.layout().unwrap().points.is_empty());
    }

    #[test]
    fn test_pair_supported_point_near_anchor() {
        let experts = ids(&["a", "b", "c"]);
        let arg = Argument::new("x", ArgumentKind::Claim, "X")
            .with_agreement(0.9)
            .endorsed_by(&["a", "c"]);
        let mut rng = StdRng::seed_from_u64(7);
        let map = ConsensusLayoutEngine::default().layout_with_rng(&experts, [&arg], &mut rng);
        let layout = map.layout().unwrap();
        let point = layout.point("x").unwrap();
        let expected = layout.region("a").unwrap().center.midpoint(layout.region("c").unwrap().center);
        assert_eq!(point.placement, Placement::Pair("a".into(), "c".into()));
        assert!(point.position.distance(expected) <= 15.0);
        assert!((point.radius - (8.0 + 4.0 * 0.9)).abs() < 1e-9);
    }

    #[test]
    fn test_contested_point_between_sides() {
        let experts = ids(&["a", "b", "c"]);
        let arg = Argument::new("x", ArgumentKind::Counter, "X")
            .spoken_by("a")
            .with_agreement(0.1)
            .rejected_by(&["b", "c"]);
        let mut rng = StdRng::seed_from_u64(3);
        let map = ConsensusLayoutEngine::default().layout_with_rng(&experts, [&arg], &mut rng);
        let layout = map.layout().unwrap();
        let point = layout.point("x").unwrap();
        assert_eq!(point.class, PointClass::Disagreement);
        assert!(matches!(point.placement, Placement::Contested { .. }));
        assert!(point.position.distance(point.anchor) <= 20.0);
        assert!((point.strength - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_highlight_restyles_without_moving() {
        let experts = ids(&["a", "b"]);
        let arg = Argument::new("x", ArgumentKind::Claim, "X")
            .with_agreement(0.9)
            .endorsed_by(&["a", "b"])
            .with_claim_kind(ClaimKind::Factual);
        let mut map = ConsensusLayoutEngine::default().layout(&experts, [&arg]);
        let layout = map.layout_mut().unwrap();
        let before = layout.point("x").unwrap().position;
        assert_eq!(layout.point("x").unwrap().style.fill, "#4CAF50");

        assert!(layout.highlight(Some("x")));
        let point = layout.point("x").unwrap();
        assert_eq!(point.position, before);
        assert_eq!(point.style.fill, "#F39C12");
        assert_eq!(point.style.stroke, "#1A2B47");

        assert!(!layout.highlight(Some("missing")));
        assert!(layout.highlighted().is_some());
        assert!(layout.highlight(None));
        assert!(layout.highlighted().is_none());
    }

    #[test]
    fn test_hit_test_finds_point() {
        let experts = ids(&["a", "b"]);
        let arg = Argument::new("x", ArgumentKind::Claim, "X")
            .with_agreement(1.0)
            .endorsed_by(&["a", "b"]);
        let map = ConsensusLayoutEngine::default().layout(&experts, [&arg]);
        let layout = map.layout().unwrap();
        let p = layout.point("x").unwrap().position;
        assert_eq!(layout.hit_test(p.x + 5.0, p.y).map(|m| m.argument_id.as_str()), Some("x"));
        assert!(layout.hit_test(0.0, 0.0).is_none());
    }
}
