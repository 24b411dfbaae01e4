//! Signal-grid environment.
use super::config::SignalGridConfig;
use anyhow::Result;
use log::{info, trace};
use ndarray::Array1;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::{BTreeMap, VecDeque};
use tsc_core::{
    error::MarlError,
    record::{Record, RecordValue},
    AgentId, AgentSpec, Env, JointAct, JointObs, Step,
};

/// Number of approaches of an intersection: north, east, south, west.
pub const N_APPROACHES: usize = 4;

/// Number of signal phases: north-south green, east-west green.
pub const N_PHASES: usize = 2;

/// Length of the observation of an intersection.
pub const OBS_DIM: usize = N_PHASES + 1 + 2 * N_APPROACHES;

/// An approach that serves no vehicles during `[from, to)` simulated seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blockage {
    /// Index of the intersection, `row * cols + col`.
    pub junction: usize,

    /// Approach, `0..4` for north, east, south, west.
    pub approach: usize,

    /// First blocked second.
    pub from: usize,

    /// First second after the blockage.
    pub to: usize,
}

#[derive(Default)]
struct Junction {
    phase: usize,
    since_switch: usize,
    // Waiting seconds of the queued vehicles, front first.
    queues: [VecDeque<f32>; N_APPROACHES],
    last_wait: f32,
}

impl Junction {
    fn green(&self) -> [usize; 2] {
        match self.phase {
            0 => [0, 2],
            _ => [1, 3],
        }
    }

    fn total_wait(&self) -> f32 {
        self.queues.iter().flat_map(|q| q.iter()).sum()
    }

    fn n_queued(&self) -> usize {
        self.queues.iter().map(|q| q.len()).sum()
    }
}

/// A grid of signalized intersections, one agent per intersection.
///
/// Intersection `(r, c)` is the agent `J{r}_{c}`. Each has four incoming
/// approaches. Vehicles enter the grid on boundary approaches with a
/// per-second probability given by the [`Level`](crate::Level), queue, and
/// are served one per second on approaches with green light. A served
/// vehicle keeps its heading and joins the queue of the next intersection,
/// or leaves the grid.
///
/// The action of an agent is the phase it requests. The phase switches
/// without yellow time, once it has been kept for `min_green` seconds.
///
/// Observation of an intersection:
/// * phase one-hot (2),
/// * `1.0` if the phase can be switched (1),
/// * queue length per approach divided by `max_queue`, capped at 1 (4),
/// * mean waiting time per approach divided by `wait_norm`, capped at 1 (4).
///
/// The reward is the decrease of the total waiting time at the intersection,
/// in hundreds of seconds, since the previous decision.
pub struct SignalGridEnv {
    config: SignalGridConfig,
    ids: Vec<AgentId>,
    junctions: Vec<Junction>,
    blockages: Vec<Blockage>,
    t: usize,
    n_departed: usize,
    rng: StdRng,
}

impl SignalGridEnv {
    /// Returns the configuration.
    pub fn config(&self) -> &SignalGridConfig {
        &self.config
    }

    /// Number of intersections.
    pub fn n_junctions(&self) -> usize {
        self.junctions.len()
    }

    /// Simulated seconds since the last reset.
    pub fn time(&self) -> usize {
        self.t
    }

    /// Number of vehicles that left the grid since the last reset.
    pub fn n_departed(&self) -> usize {
        self.n_departed
    }

    /// Number of vehicles queued in the grid.
    pub fn n_queued(&self) -> usize {
        self.junctions.iter().map(|j| j.n_queued()).sum()
    }

    /// Total waiting seconds of the vehicles queued at an intersection.
    pub fn waiting_time(&self, id: &AgentId) -> Option<f32> {
        self.index(id).map(|ix| self.junctions[ix].total_wait())
    }

    /// Current phase of an intersection.
    pub fn phase(&self, id: &AgentId) -> Option<usize> {
        self.index(id).map(|ix| self.junctions[ix].phase)
    }

    /// Sets the approaches that serve no vehicles. Cleared by [`Env::reset`].
    pub fn set_blockages(&mut self, blockages: Vec<Blockage>) {
        self.blockages = blockages;
    }

    /// Returns the current blockages.
    pub fn blockages(&self) -> &[Blockage] {
        &self.blockages
    }

    fn index(&self, id: &AgentId) -> Option<usize> {
        self.ids.iter().position(|x| x == id)
    }

    fn is_blocked(&self, junction: usize, approach: usize) -> bool {
        self.blockages.iter().any(|b| {
            b.junction == junction && b.approach == approach && b.from <= self.t && self.t < b.to
        })
    }

    /// The intersection a vehicle served on `approach` of `junction` moves to.
    fn downstream(&self, junction: usize, approach: usize) -> Option<usize> {
        let (rows, cols) = (self.config.rows, self.config.cols);
        let (r, c) = (junction / cols, junction % cols);
        match approach {
            // From the north, heading south.
            0 if r + 1 < rows => Some(junction + cols),
            // From the east, heading west.
            1 if c > 0 => Some(junction - 1),
            // From the south, heading north.
            2 if r > 0 => Some(junction - cols),
            // From the west, heading east.
            3 if c + 1 < cols => Some(junction + 1),
            _ => None,
        }
    }

    fn is_boundary(&self, junction: usize, approach: usize) -> bool {
        let (rows, cols) = (self.config.rows, self.config.cols);
        let (r, c) = (junction / cols, junction % cols);
        match approach {
            0 => r == 0,
            1 => c + 1 == cols,
            2 => r + 1 == rows,
            _ => c == 0,
        }
    }

    /// Simulates one second.
    fn tick(&mut self) {
        let rate = self.config.level.arrival_rate();
        for j in 0..self.junctions.len() {
            for k in 0..N_APPROACHES {
                if self.is_boundary(j, k) && self.rng.gen::<f32>() < rate {
                    self.junctions[j].queues[k].push_back(0.0);
                }
            }
        }

        let mut moves = vec![];
        for j in 0..self.junctions.len() {
            for k in self.junctions[j].green() {
                if self.is_blocked(j, k) {
                    continue;
                }
                if self.junctions[j].queues[k].pop_front().is_some() {
                    match self.downstream(j, k) {
                        Some(dst) => moves.push((dst, k)),
                        None => self.n_departed += 1,
                    }
                }
            }
        }

        for junction in self.junctions.iter_mut() {
            for q in junction.queues.iter_mut() {
                q.iter_mut().for_each(|w| *w += 1.0);
            }
            junction.since_switch += 1;
        }

        for (dst, k) in moves {
            self.junctions[dst].queues[k].push_back(0.0);
        }

        self.t += 1;
    }

    fn observe(&self, junction: &Junction) -> Array1<f32> {
        let mut obs = Vec::with_capacity(OBS_DIM);
        for p in 0..N_PHASES {
            obs.push(if junction.phase == p { 1.0 } else { 0.0 });
        }
        obs.push(if junction.since_switch >= self.config.min_green {
            1.0
        } else {
            0.0
        });
        let max_queue = self.config.max_queue.max(1) as f32;
        for q in junction.queues.iter() {
            obs.push((q.len() as f32 / max_queue).min(1.0));
        }
        for q in junction.queues.iter() {
            let mean = if q.is_empty() {
                0.0
            } else {
                q.iter().sum::<f32>() / q.len() as f32
            };
            obs.push((mean / self.config.wait_norm).min(1.0));
        }
        Array1::from(obs)
    }

    fn joint_obs(&self) -> JointObs {
        self.ids
            .iter()
            .zip(self.junctions.iter())
            .map(|(id, j)| (id.clone(), self.observe(j)))
            .collect()
    }
}

impl Env for SignalGridEnv {
    type Config = SignalGridConfig;
    type Info = ();

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        if config.rows == 0 || config.cols == 0 {
            return Err(MarlError::Configuration("the grid has no intersection".into()).into());
        }
        if config.delta_time == 0 || config.num_seconds == 0 {
            return Err(MarlError::Configuration(
                "delta_time and num_seconds must be positive".into(),
            )
            .into());
        }

        let ids = (0..config.rows)
            .flat_map(|r| (0..config.cols).map(move |c| AgentId::new(format!("J{}_{}", r, c))))
            .collect::<Vec<_>>();
        let junctions = ids.iter().map(|_| Junction::default()).collect();
        info!(
            "Built signal grid {}x{}, level {}, {} seconds per episode",
            config.rows, config.cols, config.level, config.num_seconds
        );

        Ok(Self {
            config: config.clone(),
            ids,
            junctions,
            blockages: vec![],
            t: 0,
            n_departed: 0,
            rng: StdRng::seed_from_u64(seed as u64),
        })
    }

    fn agent_specs(&self) -> BTreeMap<AgentId, AgentSpec> {
        self.ids
            .iter()
            .map(|id| (id.clone(), AgentSpec::new(OBS_DIM, N_PHASES)))
            .collect()
    }

    fn reset(&mut self) -> Result<JointObs> {
        trace!("SignalGridEnv::reset()");
        self.junctions.iter_mut().for_each(|j| *j = Junction::default());
        self.blockages.clear();
        self.t = 0;
        self.n_departed = 0;
        Ok(self.joint_obs())
    }

    fn step(&mut self, act: &JointAct) -> Result<(Step<Self>, Record)> {
        for (ix, id) in self.ids.iter().enumerate() {
            let a = *act
                .get(id)
                .ok_or_else(|| MarlError::UnknownAgent(id.to_string()))?;
            if a >= N_PHASES {
                return Err(
                    MarlError::Environment(format!("invalid phase {} for {}", a, id)).into(),
                );
            }
            let junction = &mut self.junctions[ix];
            if a != junction.phase && junction.since_switch >= self.config.min_green {
                junction.phase = a;
                junction.since_switch = 0;
            }
        }

        for _ in 0..self.config.delta_time {
            self.tick();
        }

        let mut reward = BTreeMap::new();
        for (id, junction) in self.ids.iter().zip(self.junctions.iter_mut()) {
            let wait = junction.total_wait() / 100.0;
            reward.insert(id.clone(), junction.last_wait - wait);
            junction.last_wait = wait;
        }

        let truncated = self.t >= self.config.num_seconds;
        let is_terminated = self.ids.iter().map(|id| (id.clone(), false)).collect();
        let is_truncated = self.ids.iter().map(|id| (id.clone(), truncated)).collect();
        let obs = self.joint_obs();

        let total_wait: f32 = self.junctions.iter().map(|j| j.total_wait()).sum();
        let record = Record::from_slice(&[
            ("system_total_waiting_time", RecordValue::Scalar(total_wait)),
            ("system_total_queued", RecordValue::Scalar(self.n_queued() as f32)),
        ]);

        let step = Step::new(obs, act.clone(), reward, is_terminated, is_truncated, ());
        Ok((step, record))
    }
}
