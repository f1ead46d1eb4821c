//! Steppable force-directed layout
//!
//! A velocity Verlet simulation with the same force model and constants as
//! d3-force: link springs, many-body repulsion, a centering shift and
//! circle collision. The simulation is advanced explicitly by the caller
//! (`tick`, `advance`, `run_to_convergence`) so it can be driven by a timer,
//! a render loop or a test without any framework callback.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use colloquy_core::{ArgumentId, ArgumentKind, Relation};

use crate::geometry::Point;
use crate::graph::ArgumentGraph;

/// Alpha target applied while any node is being dragged
const DRAG_ALPHA_TARGET: f64 = 0.3;

/// Tunables for [`ForceSimulation`]
#[derive(Debug, Clone, PartialEq)]
pub struct ForceConfig {
    /// Canvas width; the centering force targets `width / 2`
    pub width: f64,
    /// Canvas height; the centering force targets `height / 2`
    pub height: f64,
    /// Rest length of link springs
    pub link_distance: f64,
    /// Many-body strength (negative repels)
    pub charge_strength: f64,
    /// Collision radius of every node
    pub collide_radius: f64,
    pub alpha_min: f64,
    pub alpha_decay: f64,
    /// Fraction of velocity removed each tick
    pub velocity_decay: f64,
    /// Mean squared speed per node below which the layout is settled
    pub energy_threshold: f64,
    /// Tick budget before giving up on convergence
    pub max_ticks: usize,
    /// Wall-clock duration one tick represents in [`ForceSimulation::advance`]
    pub tick_interval: Duration,
    /// Seed for the coincident-node jiggle
    pub seed: u64,
}

impl Default for ForceConfig {
    fn default() -> Self {
        let alpha_min: f64 = 0.001;
        Self {
            width: 800.0,
            height: 600.0,
            link_distance: 100.0,
            charge_strength: -200.0,
            collide_radius: 50.0,
            alpha_min,
            // Reaches alpha_min from 1.0 in 300 ticks
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            velocity_decay: 0.4,
            energy_threshold: 0.001,
            max_ticks: 300,
            tick_interval: Duration::from_millis(16),
            seed: 0x5eed,
        }
    }
}

impl ForceConfig {
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Where a simulation is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationStatus {
    #[default]
    Running,
    /// Alpha or kinetic energy fell below threshold
    Settled,
    /// Tick budget spent before settling
    Exhausted,
    /// Stopped through a [`CancelHandle`]
    Cancelled,
}

impl SimulationStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

/// Shared flag that stops a simulation from any thread
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A node with its current position
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedNode {
    pub id: ArgumentId,
    pub kind: ArgumentKind,
    pub label: String,
    pub radius: f64,
    pub primary: bool,
    pub pinned: bool,
    pub x: f64,
    pub y: f64,
}

/// A link with both endpoints resolved to node positions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedLink {
    pub source: ArgumentId,
    pub target: ArgumentId,
    pub relation: Relation,
    pub from: Point,
    pub to: Point,
}

/// Snapshot of the layout after some number of ticks
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayoutFrame {
    pub tick: usize,
    pub alpha: f64,
    pub status: SimulationStatus,
    pub nodes: Vec<PositionedNode>,
    pub links: Vec<PositionedLink>,
}

impl LayoutFrame {
    pub fn node(&self, id: &str) -> Option<&PositionedNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

#[derive(Debug, Clone)]
struct Body {
    x: f64,
    y: f64,
    vx: f64,
    vy: f64,
    fixed: Option<Point>,
}

#[derive(Debug, Clone, Copy)]
struct Spring {
    source: usize,
    target: usize,
    strength: f64,
    bias: f64,
}

/// Force-directed layout of an [`ArgumentGraph`]
#[derive(Debug)]
pub struct ForceSimulation {
    config: ForceConfig,
    graph: ArgumentGraph,
    index: HashMap<ArgumentId, usize>,
    bodies: Vec<Body>,
    springs: Vec<Spring>,
    alpha: f64,
    alpha_target: f64,
    /// Ticks since the last start or restart
    ticks: usize,
    status: SimulationStatus,
    dragging: usize,
    cancel: CancelHandle,
    rng: StdRng,
}

impl ForceSimulation {
    /// Create a simulation with nodes in phyllotaxis arrangement around the center
    pub fn new(graph: &ArgumentGraph, config: ForceConfig) -> Self {
        let center = config.center();
        let initial_angle = std::f64::consts::PI * (3.0 - 5f64.sqrt());

        let bodies: Vec<Body> = (0..graph.nodes.len())
            .map(|i| {
                let radius = 10.0 * (0.5 + i as f64).sqrt();
                let angle = i as f64 * initial_angle;
                Body {
                    x: center.x + radius * angle.cos(),
                    y: center.y + radius * angle.sin(),
                    vx: 0.0,
                    vy: 0.0,
                    fixed: None,
                }
            })
            .collect();

        let index: HashMap<ArgumentId, usize> = graph
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();

        let endpoints: Vec<(usize, usize)> = graph
            .links
            .iter()
            .filter_map(|l| Some((*index.get(&l.source)?, *index.get(&l.target)?)))
            .collect();

        let mut degree = vec![0usize; bodies.len()];
        for &(s, t) in &endpoints {
            degree[s] += 1;
            degree[t] += 1;
        }
        let springs = endpoints
            .into_iter()
            .map(|(source, target)| Spring {
                source,
                target,
                strength: 1.0 / degree[source].min(degree[target]) as f64,
                bias: degree[source] as f64 / (degree[source] + degree[target]) as f64,
            })
            .collect();

        let status = if bodies.is_empty() {
            SimulationStatus::Settled
        } else {
            SimulationStatus::Running
        };

        tracing::debug!(
            nodes = bodies.len(),
            links = graph.links.len(),
            "Force simulation created"
        );

        Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            graph: graph.clone(),
            index,
            bodies,
            springs,
            alpha: 1.0,
            alpha_target: 0.0,
            ticks: 0,
            status,
            dragging: 0,
            cancel: CancelHandle::default(),
        }
    }

    pub fn config(&self) -> &ForceConfig {
        &self.config
    }

    pub fn status(&self) -> SimulationStatus {
        self.status
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn ticks(&self) -> usize {
        self.ticks
    }

    pub fn node_count(&self) -> usize {
        self.bodies.len()
    }

    /// Handle that stops this simulation; later ticks become no-ops
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn position(&self, id: &str) -> Option<Point> {
        self.index
            .get(id)
            .map(|&i| Point::new(self.bodies[i].x, self.bodies[i].y))
    }

    /// Mean squared speed per node
    pub fn kinetic_energy(&self) -> f64 {
        if self.bodies.is_empty() {
            return 0.0;
        }
        let total: f64 = self.bodies.iter().map(|b| b.vx * b.vx + b.vy * b.vy).sum();
        total / self.bodies.len() as f64
    }

    /// Run one simulation step and return the resulting status
    pub fn tick(&mut self) -> SimulationStatus {
        if self.cancel.is_cancelled() {
            self.status = SimulationStatus::Cancelled;
        }
        if !self.status.is_running() {
            return self.status;
        }

        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
        let alpha = self.alpha;

        apply_links(&mut self.bodies, &self.springs, self.config.link_distance, alpha, &mut self.rng);
        apply_many_body(&mut self.bodies, self.config.charge_strength, alpha, &mut self.rng);
        apply_center(&mut self.bodies, self.config.center());
        apply_collide(&mut self.bodies, self.config.collide_radius, &mut self.rng);

        let retain = 1.0 - self.config.velocity_decay;
        for body in &mut self.bodies {
            match body.fixed {
                Some(p) => {
                    body.x = p.x;
                    body.y = p.y;
                    body.vx = 0.0;
                    body.vy = 0.0;
                }
                None => {
                    body.vx *= retain;
                    body.vy *= retain;
                    body.x += body.vx;
                    body.y += body.vy;
                }
            }
        }
        self.ticks += 1;

        if self.dragging == 0 {
            if self.alpha < self.config.alpha_min
                || self.kinetic_energy() < self.config.energy_threshold
            {
                self.status = SimulationStatus::Settled;
                tracing::debug!(ticks = self.ticks, alpha = self.alpha, "Layout settled");
            } else if self.ticks >= self.config.max_ticks {
                self.status = SimulationStatus::Exhausted;
                tracing::debug!(ticks = self.ticks, "Layout tick budget exhausted");
            }
        }

        self.status
    }

    /// Step the simulation for the ticks that fit in `dt` (at least one)
    pub fn advance(&mut self, dt: Duration) -> LayoutFrame {
        let interval = self.config.tick_interval.as_secs_f64();
        let steps = if interval > 0.0 {
            ((dt.as_secs_f64() / interval).ceil() as usize).max(1)
        } else {
            1
        };
        for _ in 0..steps {
            if !self.tick().is_running() {
                break;
            }
        }
        self.frame()
    }

    /// Tick until settled, exhausted or cancelled, bounded by `max_ticks`
    pub fn run_to_convergence(&mut self) -> LayoutFrame {
        for _ in 0..self.config.max_ticks {
            if !self.tick().is_running() {
                break;
            }
        }
        self.frame()
    }

    /// Pin a node at a fixed position and re-engage the simulation.
    ///
    /// Returns false if no node has that id.
    pub fn pin(&mut self, id: &str, x: f64, y: f64) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        if self.bodies[i].fixed.is_none() {
            self.dragging += 1;
        }
        self.bodies[i].fixed = Some(Point::new(x, y));
        self.alpha_target = DRAG_ALPHA_TARGET;
        self.restart();
        true
    }

    /// Move a node that is being dragged
    pub fn drag_to(&mut self, id: &str, x: f64, y: f64) -> bool {
        self.pin(id, x, y)
    }

    /// Release a pinned node and let the layout cool down again
    pub fn release(&mut self, id: &str) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        if self.bodies[i].fixed.take().is_some() {
            self.dragging = self.dragging.saturating_sub(1);
        }
        if self.dragging == 0 {
            self.alpha_target = 0.0;
        }
        self.restart();
        true
    }

    /// Reset the tick budget and resume unless cancelled
    fn restart(&mut self) {
        if self.status != SimulationStatus::Cancelled && !self.bodies.is_empty() {
            self.status = SimulationStatus::Running;
            self.ticks = 0;
            self.alpha = self.alpha.max(self.alpha_target);
        }
    }

    /// Current positions of every node and link
    pub fn frame(&self) -> LayoutFrame {
        let nodes = self
            .graph
            .nodes
            .iter()
            .zip(&self.bodies)
            .map(|(node, body)| PositionedNode {
                id: node.id.clone(),
                kind: node.kind,
                label: node.label.clone(),
                radius: node.radius,
                primary: node.primary,
                pinned: body.fixed.is_some(),
                x: body.x,
                y: body.y,
            })
            .collect();

        let links = self
            .graph
            .links
            .iter()
            .filter_map(|link| {
                Some(PositionedLink {
                    source: link.source.clone(),
                    target: link.target.clone(),
                    relation: link.relation,
                    from: self.position(&link.source)?,
                    to: self.position(&link.target)?,
                })
            })
            .collect();

        LayoutFrame {
            tick: self.ticks,
            alpha: self.alpha,
            status: self.status,
            nodes,
            links,
        }
    }
}

fn jiggle(rng: &mut StdRng) -> f64 {
    (rng.random::<f64>() - 0.5) * 1e-6
}

fn apply_links(bodies: &mut [Body], springs: &[Spring], distance: f64, alpha: f64, rng: &mut StdRng) {
    for spring in springs {
        let (s, t) = (&bodies[spring.source], &bodies[spring.target]);
        let mut x = t.x + t.vx - s.x - s.vx;
        let mut y = t.y + t.vy - s.y - s.vy;
        if x == 0.0 {
            x = jiggle(rng);
        }
        if y == 0.0 {
            y = jiggle(rng);
        }
        let len = (x * x + y * y).sqrt();
        let k = (len - distance) / len * alpha * spring.strength;
        x *= k;
        y *= k;

        let target = &mut bodies[spring.target];
        target.vx -= x * spring.bias;
        target.vy -= y * spring.bias;
        let source = &mut bodies[spring.source];
        source.vx += x * (1.0 - spring.bias);
        source.vy += y * (1.0 - spring.bias);
    }
}

fn apply_many_body(bodies: &mut [Body], strength: f64, alpha: f64, rng: &mut StdRng) {
    const DISTANCE_MIN2: f64 = 1.0;
    let n = bodies.len();
    let mut deltas = vec![(0.0, 0.0); n];
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let mut x = bodies[j].x - bodies[i].x;
            let mut y = bodies[j].y - bodies[i].y;
            let mut l = x * x + y * y;
            if x == 0.0 {
                x = jiggle(rng);
                l += x * x;
            }
            if y == 0.0 {
                y = jiggle(rng);
                l += y * y;
            }
            if l < DISTANCE_MIN2 {
                l = (DISTANCE_MIN2 * l).sqrt();
            }
            deltas[i].0 += x * strength * alpha / l;
            deltas[i].1 += y * strength * alpha / l;
        }
    }
    for (body, (dx, dy)) in bodies.iter_mut().zip(deltas) {
        body.vx += dx;
        body.vy += dy;
    }
}

fn apply_center(bodies: &mut [Body], center: Point) {
    let positions: Vec<Point> = bodies.iter().map(|b| Point::new(b.x, b.y)).collect();
    let Some(mean) = Point::centroid(&positions) else {
        return;
    };
    let (dx, dy) = (mean.x - center.x, mean.y - center.y);
    for body in bodies {
        body.x -= dx;
        body.y -= dy;
    }
}

fn apply_collide(bodies: &mut [Body], radius: f64, rng: &mut StdRng) {
    let n = bodies.len();
    let reach = radius + radius;
    // Equal radii split every correction evenly between the pair
    let share = radius * radius / (radius * radius + radius * radius);
    for i in 0..n {
        let xi = bodies[i].x + bodies[i].vx;
        let yi = bodies[i].y + bodies[i].vy;
        for j in (i + 1)..n {
            let mut x = xi - (bodies[j].x + bodies[j].vx);
            let mut y = yi - (bodies[j].y + bodies[j].vy);
            let mut l = x * x + y * y;
            if l >= reach * reach {
                continue;
            }
            if x == 0.0 {
                x = jiggle(rng);
                l += x * x;
            }
            if y == 0.0 {
                y = jiggle(rng);
                l += y * y;
            }
            let len = l.sqrt();
            let k = (reach - len) / len;
            x *= k;
            y *= k;
            bodies[i].vx += x * share;
            bodies[i].vy += y * share;
            bodies[j].vx -= x * (1.0 - share);
            bodies[j].vy -= y * (1.0 - share);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphLink, GraphNode};

    fn node(id: &str) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            kind: ArgumentKind::Claim,
            label: id.to_string(),
            strength: 0.5,
            radius: 25.0,
            primary: true,
            speaker_id: None,
        }
    }

    fn pair() -> ArgumentGraph {
        ArgumentGraph {
            nodes: vec![node("a"), node("b")],
            links: vec![GraphLink {
                source: "a".into(),
                target: "b".into(),
                relation: Relation::Supports,
            }],
        }
    }

    #[test]
    fn test_empty_graph_is_settled() {
        let mut sim = ForceSimulation::new(&ArgumentGraph::default(), ForceConfig::default());
        assert_eq!(sim.status(), SimulationStatus::Settled);
        let frame = sim.run_to_convergence();
        assert!(frame.nodes.is_empty());
        assert!(frame.links.is_empty());
    }

    #[test]
    fn test_default_decay_reaches_min_in_300_ticks() {
        let config = ForceConfig::default();
        let alpha = (1.0 - config.alpha_decay).powi(300);
        assert!((alpha - config.alpha_min).abs() < 1e-9);
    }

    #[test]
    fn test_linked_pair_separates() {
        let mut sim = ForceSimulation::new(&pair(), ForceConfig::default());
        let frame = sim.run_to_convergence();
        assert_ne!(frame.status, SimulationStatus::Running);

        let a = sim.position("a").unwrap();
        let b = sim.position("b").unwrap();
        // Collision keeps centres at least ~2 radii apart
        assert!(a.distance(b) > 90.0, "distance {}", a.distance(b));
        let mid = a.midpoint(b);
        assert!(mid.distance(sim.config().center()) < 1.0);
    }

    #[test]
    fn test_deterministic_for_same_seed() {
        let mut one = ForceSimulation::new(&pair(), ForceConfig::default());
        let mut two = ForceSimulation::new(&pair(), ForceConfig::default());
        assert_eq!(one.run_to_convergence(), two.run_to_convergence());
    }

    #[test]
    fn test_pinned_node_stays_put() {
        let mut sim = ForceSimulation::new(&pair(), ForceConfig::default());
        sim.run_to_convergence();
        assert!(sim.pin("a", 100.0, 100.0));
        for _ in 0..50 {
            sim.tick();
        }
        assert_eq!(sim.position("a"), Some(Point::new(100.0, 100.0)));
        assert!(sim.status().is_running());
        assert!(sim.frame().node("a").unwrap().pinned);

        assert!(sim.release("a"));
        let frame = sim.run_to_convergence();
        assert!(!frame.node("a").unwrap().pinned);
    }

    #[test]
    fn test_pin_unknown_node() {
        let mut sim = ForceSimulation::new(&pair(), ForceConfig::default());
        assert!(!sim.pin("ghost", 0.0, 0.0));
        assert!(!sim.release("ghost"));
    }

    #[test]
    fn test_cancel_stops_ticks() {
        let mut sim = ForceSimulation::new(&pair(), ForceConfig::default());
        let handle = sim.cancel_handle();
        sim.tick();
        handle.cancel();
        let before = sim.position("a");
        assert_eq!(sim.tick(), SimulationStatus::Cancelled);
        assert_eq!(sim.position("a"), before);
        assert_eq!(sim.ticks(), 1);
    }

    #[test]
    fn test_advance_runs_ticks_for_duration() {
        let mut sim = ForceSimulation::new(&pair(), ForceConfig::default());
        let frame = sim.advance(Duration::from_millis(48));
        assert_eq!(frame.tick, 3);
        let frame = sim.advance(Duration::ZERO);
        assert_eq!(frame.tick, 4);
    }
}
