//! Frame graph: the per-frame pass list with declared reads and writes.
//!
//! Both backends walk the same ordered task list. Barriers are derived
//! mechanically: every read (or overwrite) of a resource waits on the last
//! task that wrote it, with the destination stages being the union of every
//! consumer of that write. Resources read before any write in the frame are
//! persistent state carried over from the previous frame.

use std::collections::BTreeMap;
use std::fmt;

use wgpu::ShaderStages;

use crate::error::GraphError;

/// Independent spectral band
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Band {
    Swell,
    Wind,
}

impl Band {
    pub const ALL: [Band; 2] = [Band::Swell, Band::Wind];

    pub fn index(self) -> usize {
        match self {
            Band::Swell => 0,
            Band::Wind => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Band::Swell => "swell",
            Band::Wind => "wind",
        }
    }
}

/// Compute stages of the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Spectrum(Band),
    TileBuild(Band),
    RowFft(Band),
    ColumnFft(Band),
    Combine,
    Foam,
    SprayUpdate,
    SpraySpawn,
}

/// Graphics passes consuming simulation output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Draw {
    Water,
    Spray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Node {
    Compute(Stage),
    Draw(Draw),
}

/// GPU resources touched by the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Resource {
    Spectrum(Band),
    PackedA(Band),
    PackedB(Band),
    Displacement,
    /// Foam written last frame (read-only this frame)
    FoamCurrent,
    /// Foam written this frame
    FoamNext,
    Particles,
    SprayCounter,
}

impl Resource {
    /// Carried across frames; may be read before any in-frame write
    pub fn is_persistent(self) -> bool {
        matches!(
            self,
            Resource::FoamCurrent | Resource::Particles | Resource::SprayCounter
        )
    }
}

/// How a consumer touches a resource after the barrier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
    ReadWrite,
}

impl Access {
    fn merge(self, other: Access) -> Access {
        if self == other {
            self
        } else {
            Access::ReadWrite
        }
    }
}

/// One node with the shader stages it reads each resource from
#[derive(Debug, Clone)]
pub struct Task {
    pub node: Node,
    pub reads: Vec<(Resource, ShaderStages)>,
    pub writes: Vec<Resource>,
}

impl Task {
    fn compute(stage: Stage, reads: &[Resource], writes: &[Resource]) -> Self {
        Self {
            node: Node::Compute(stage),
            reads: reads.iter().map(|&r| (r, ShaderStages::COMPUTE)).collect(),
            writes: writes.to_vec(),
        }
    }

    fn draw(draw: Draw, reads: &[(Resource, ShaderStages)]) -> Self {
        Self {
            node: Node::Draw(draw),
            reads: reads.to_vec(),
            writes: Vec::new(),
        }
    }
}

/// Execution/memory dependency between a producer and its consumers
#[derive(Debug, Clone, PartialEq)]
pub struct Barrier {
    pub resource: Resource,
    pub producer: Node,
    /// First consumer; the barrier sits immediately before it
    pub before: Node,
    pub consumers: Vec<Node>,
    pub src: ShaderStages,
    pub dst: ShaderStages,
    pub access: Access,
}

/// Ordered, validated task list for one frame
#[derive(Debug, Clone)]
pub struct FrameGraph {
    tasks: Vec<Task>,
}

impl FrameGraph {
    /// Standard ocean frame: both FFT chains, combine, foam, spray, then draws
    pub fn ocean_frame() -> Self {
        use Resource::*;

        let mut tasks = Vec::new();
        for band in Band::ALL {
            tasks.push(Task::compute(Stage::Spectrum(band), &[], &[Spectrum(band)]));
            tasks.push(Task::compute(
                Stage::TileBuild(band),
                &[Spectrum(band)],
                &[PackedA(band)],
            ));
            tasks.push(Task::compute(
                Stage::RowFft(band),
                &[PackedA(band)],
                &[PackedB(band)],
            ));
            tasks.push(Task::compute(
                Stage::ColumnFft(band),
                &[PackedB(band)],
                &[PackedA(band)],
            ));
        }
        tasks.push(Task::compute(
            Stage::Combine,
            &[PackedA(Band::Swell), PackedA(Band::Wind)],
            &[Displacement],
        ));
        tasks.push(Task::compute(
            Stage::Foam,
            &[Displacement, FoamCurrent],
            &[FoamNext],
        ));
        tasks.push(Task::compute(
            Stage::SprayUpdate,
            &[Particles],
            &[Particles],
        ));
        tasks.push(Task::compute(
            Stage::SpraySpawn,
            &[Displacement, SprayCounter],
            &[Particles, SprayCounter],
        ));
        tasks.push(Task::draw(
            Draw::Water,
            &[
                (Displacement, ShaderStages::VERTEX | ShaderStages::FRAGMENT),
                (FoamNext, ShaderStages::FRAGMENT),
            ],
        ));
        tasks.push(Task::draw(Draw::Spray, &[(Particles, ShaderStages::VERTEX)]));

        Self { tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Compute stages in execution order
    pub fn compute_stages(&self) -> impl Iterator<Item = Stage> + '_ {
        self.tasks.iter().filter_map(|task| match task.node {
            Node::Compute(stage) => Some(stage),
            Node::Draw(_) => None,
        })
    }

    /// Check that every transient read has an earlier writer
    pub fn validate(&self) -> Result<(), GraphError> {
        let mut written = Vec::new();
        for task in &self.tasks {
            for &(resource, _) in &task.reads {
                if !resource.is_persistent() && !written.contains(&resource) {
                    return Err(GraphError::UnproducedRead {
                        node: task.node.to_string(),
                        resource: resource.to_string(),
                    });
                }
            }
            written.extend(task.writes.iter().copied());
        }
        Ok(())
    }

    /// Derive every barrier the frame needs, ordered by placement
    pub fn barriers(&self) -> Vec<Barrier> {
        // (resource, producer task index) -> (first consumer index, barrier)
        let mut pending: BTreeMap<(Resource, usize), (usize, Barrier)> = BTreeMap::new();
        let mut last_writer: BTreeMap<Resource, usize> = BTreeMap::new();

        for (index, task) in self.tasks.iter().enumerate() {
            let writes = task
                .writes
                .iter()
                .map(|&r| (r, ShaderStages::COMPUTE, Access::Write));
            let reads = task.reads.iter().map(|&(r, s)| (r, s, Access::Read));

            for (resource, stages, access) in reads.chain(writes) {
                let Some(&producer) = last_writer.get(&resource) else {
                    continue;
                };
                let producer_node = self.tasks[producer].node;
                let entry = pending
                    .entry((resource, producer))
                    .or_insert_with(|| {
                        (
                            index,
                            Barrier {
                                resource,
                                producer: producer_node,
                                before: task.node,
                                consumers: Vec::new(),
                                src: ShaderStages::COMPUTE,
                                dst: ShaderStages::empty(),
                                access,
                            },
                        )
                    });
                let barrier = &mut entry.1;
                barrier.dst |= stages;
                barrier.access = barrier.access.merge(access);
                if !barrier.consumers.contains(&task.node) {
                    barrier.consumers.push(task.node);
                }
            }

            for &resource in &task.writes {
                last_writer.insert(resource, index);
            }
        }

        let mut barriers: Vec<(usize, Barrier)> = pending.into_values().collect();
        barriers.sort_by_key(|(first_consumer, _)| *first_consumer);
        barriers.into_iter().map(|(_, barrier)| barrier).collect()
    }

    /// Barriers placed immediately before `node`
    pub fn barriers_before(&self, node: Node) -> Vec<Barrier> {
        self.barriers()
            .into_iter()
            .filter(|barrier| barrier.before == node)
            .collect()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Spectrum(band) => write!(f, "spectrum[{}]", band.name()),
            Stage::TileBuild(band) => write!(f, "tile_build[{}]", band.name()),
            Stage::RowFft(band) => write!(f, "ifft_rows[{}]", band.name()),
            Stage::ColumnFft(band) => write!(f, "ifft_cols[{}]", band.name()),
            Stage::Combine => write!(f, "combine"),
            Stage::Foam => write!(f, "foam"),
            Stage::SprayUpdate => write!(f, "spray_update"),
            Stage::SpraySpawn => write!(f, "spray_spawn"),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Compute(stage) => write!(f, "{}", stage),
            Node::Draw(Draw::Water) => write!(f, "draw_water"),
            Node::Draw(Draw::Spray) => write!(f, "draw_spray"),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Spectrum(band) => write!(f, "spectrum_{}", band.name()),
            Resource::PackedA(band) => write!(f, "packed_a_{}", band.name()),
            Resource::PackedB(band) => write!(f, "packed_b_{}", band.name()),
            Resource::Displacement => write!(f, "displacement"),
            Resource::FoamCurrent => write!(f, "foam_current"),
            Resource::FoamNext => write!(f, "foam_next"),
            Resource::Particles => write!(f, "particles"),
            Resource::SprayCounter => write!(f, "spray_counter"),
        }
    }
}

impl fmt::Display for Barrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} -> {} ({:?} -> {:?}, {:?})",
            self.resource, self.producer, self.before, self.src, self.dst, self.access
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(graph: &FrameGraph, node: Node) -> usize {
        graph
            .tasks()
            .iter()
            .position(|task| task.node == node)
            .unwrap()
    }

    fn barrier_for(graph: &FrameGraph, resource: Resource, producer: Node) -> Barrier {
        graph
            .barriers()
            .into_iter()
            .find(|b| b.resource == resource && b.producer == producer)
            .unwrap()
    }

    #[test]
    fn test_ocean_frame_is_valid() {
        assert_eq!(FrameGraph::ocean_frame().validate(), Ok(()));
    }

    #[test]
    fn test_fft_chain_order() {
        let graph = FrameGraph::ocean_frame();
        for band in Band::ALL {
            let order = [
                Stage::Spectrum(band),
                Stage::TileBuild(band),
                Stage::RowFft(band),
                Stage::ColumnFft(band),
                Stage::Combine,
            ];
            for pair in order.windows(2) {
                assert!(
                    position(&graph, Node::Compute(pair[0])) < position(&graph, Node::Compute(pair[1]))
                );
            }
        }
        let combine = position(&graph, Node::Compute(Stage::Combine));
        for later in [Stage::Foam, Stage::SprayUpdate, Stage::SpraySpawn] {
            assert!(combine < position(&graph, Node::Compute(later)));
        }
        assert!(
            position(&graph, Node::Compute(Stage::SprayUpdate))
                < position(&graph, Node::Compute(Stage::SpraySpawn))
        );
    }

    #[test]
    fn test_every_read_waits_on_its_writer() {
        let graph = FrameGraph::ocean_frame();
        let barriers = graph.barriers();
        for (index, task) in graph.tasks().iter().enumerate() {
            for &(resource, stages) in &task.reads {
                let writer = graph.tasks()[..index]
                    .iter()
                    .rposition(|t| t.writes.contains(&resource));
                let Some(writer) = writer else {
                    assert!(resource.is_persistent(), "{} read without writer", resource);
                    continue;
                };
                let producer = graph.tasks()[writer].node;
                let barrier = barriers
                    .iter()
                    .find(|b| b.resource == resource && b.producer == producer)
                    .unwrap();
                assert!(barrier.consumers.contains(&task.node));
                assert!(barrier.dst.contains(stages));
                assert!(position(&graph, barrier.before) <= index);
            }
        }
    }

    #[test]
    fn test_displacement_barrier_reaches_vertex_and_fragment() {
        let graph = FrameGraph::ocean_frame();
        let barrier = barrier_for(&graph, Resource::Displacement, Node::Compute(Stage::Combine));
        assert_eq!(barrier.src, ShaderStages::COMPUTE);
        assert_eq!(
            barrier.dst,
            ShaderStages::COMPUTE | ShaderStages::VERTEX | ShaderStages::FRAGMENT
        );
        assert_eq!(barrier.before, Node::Compute(Stage::Foam));
        assert_eq!(barrier.access, Access::Read);
    }

    #[test]
    fn test_foam_barrier_is_fragment_only() {
        let graph = FrameGraph::ocean_frame();
        let barrier = barrier_for(&graph, Resource::FoamNext, Node::Compute(Stage::Foam));
        assert_eq!(barrier.dst, ShaderStages::FRAGMENT);
        assert_eq!(barrier.consumers, vec![Node::Draw(Draw::Water)]);
    }

    #[test]
    fn test_particle_barriers() {
        let graph = FrameGraph::ocean_frame();
        // Update must finish before spawn overwrites slots
        let update = barrier_for(&graph, Resource::Particles, Node::Compute(Stage::SprayUpdate));
        assert_eq!(update.before, Node::Compute(Stage::SpraySpawn));
        assert_eq!(update.dst, ShaderStages::COMPUTE);
        assert_eq!(update.access, Access::Write);

        let spawn = barrier_for(&graph, Resource::Particles, Node::Compute(Stage::SpraySpawn));
        assert_eq!(spawn.dst, ShaderStages::VERTEX);
        assert_eq!(spawn.before, Node::Draw(Draw::Spray));
    }

    #[test]
    fn test_column_pass_overwrite_waits_on_row_pass_read() {
        let graph = FrameGraph::ocean_frame();
        let barrier = barrier_for(
            &graph,
            Resource::PackedA(Band::Wind),
            Node::Compute(Stage::TileBuild(Band::Wind)),
        );
        assert_eq!(
            barrier.consumers,
            vec![
                Node::Compute(Stage::RowFft(Band::Wind)),
                Node::Compute(Stage::ColumnFft(Band::Wind))
            ]
        );
        assert_eq!(barrier.access, Access::ReadWrite);
    }

    #[test]
    fn test_rejects_read_without_writer() {
        let graph = FrameGraph {
            tasks: vec![Task::compute(Stage::Combine, &[Resource::Displacement], &[])],
        };
        assert!(graph.validate().is_err());
    }
}
