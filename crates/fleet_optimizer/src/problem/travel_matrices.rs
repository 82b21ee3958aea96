use serde::Serialize;

use crate::problem::{
    node::NodeIdx,
    periods::PeriodIdx,
    validation::{ValidationError, check_square, check_values},
};

pub type Distance = f64;
pub type Time = f64;

/// Per-period travel times and period-independent distances between nodes.
///
/// Matrices are stored flat, the value of the arc `(from, to)` is found at
/// `from * num_nodes + to`. Travel times are in minutes and an infinite travel time marks
/// an arc that cannot be used during that period.
#[derive(Debug, Clone, Serialize)]
pub struct TravelMatrices {
    times: Vec<Vec<Time>>,
    distances: Vec<Distance>,
    num_nodes: usize,
    is_symmetric: bool,
}

fn is_flat_matrix_symmetric(matrix: &[f64], num_nodes: usize) -> bool {
    (0..num_nodes).all(|i| {
        (0..num_nodes).all(|j| matrix[i * num_nodes + j] == matrix[j * num_nodes + i])
    })
}

impl TravelMatrices {
    /// `times[t][i][j]` is the travel time of arc `(i, j)` when leaving during period `t`.
    pub fn new(
        times: Vec<Vec<Vec<Time>>>,
        distances: Vec<Vec<Distance>>,
    ) -> Result<Self, ValidationError> {
        let num_nodes = distances.len();

        check_square("distance", &distances, num_nodes)?;
        for period_times in &times {
            check_square("travel time", period_times, num_nodes)?;
        }

        let distances: Vec<Distance> = distances.into_iter().flatten().collect();
        check_values("distance", &distances, num_nodes, true)?;

        let times = times
            .into_iter()
            .map(|period_times| {
                let flat: Vec<Time> = period_times.into_iter().flatten().collect();
                check_values("travel time", &flat, num_nodes, true).map(|_| flat)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let is_symmetric = is_flat_matrix_symmetric(&distances, num_nodes)
            && times
                .iter()
                .all(|flat| is_flat_matrix_symmetric(flat, num_nodes));

        Ok(TravelMatrices {
            times,
            distances,
            num_nodes,
            is_symmetric,
        })
    }

    /// Same travel time and distance on every arc and period.
    pub fn uniform(num_nodes: usize, num_periods: usize, time: Time, distance: Distance) -> Self {
        let flat = |value: f64| {
            let mut matrix = vec![value; num_nodes * num_nodes];
            for i in 0..num_nodes {
                matrix[i * num_nodes + i] = 0.0;
            }
            matrix
        };

        TravelMatrices {
            times: vec![flat(time); num_periods],
            distances: flat(distance),
            num_nodes,
            is_symmetric: true,
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn num_periods(&self) -> usize {
        self.times.len()
    }

    pub fn is_symmetric(&self) -> bool {
        self.is_symmetric
    }

    #[inline]
    pub fn travel_time(&self, period: PeriodIdx, from: NodeIdx, to: NodeIdx) -> Time {
        self.times[period.get()][from.get() * self.num_nodes + to.get()]
    }

    #[inline]
    pub fn travel_distance(&self, from: NodeIdx, to: NodeIdx) -> Distance {
        self.distances[from.get() * self.num_nodes + to.get()]
    }

    /// An arc can be used during a period when it joins two distinct nodes and its travel
    /// time is finite.
    #[inline]
    pub fn is_reachable(&self, period: PeriodIdx, from: NodeIdx, to: NodeIdx) -> bool {
        from != to && self.travel_time(period, from, to).is_finite()
    }

    /// Longest finite travel time towards `to`, over every origin and period.
    pub fn max_finite_time_to(&self, to: NodeIdx) -> Time {
        self.times
            .iter()
            .flat_map(|flat| {
                (0..self.num_nodes).map(move |from| flat[from * self.num_nodes + to.get()])
            })
            .filter(|time| time.is_finite())
            .fold(0.0, f64::max)
    }

    /// Sum of the finite distances over every arc `(i, j)` with `i != j`.
    pub fn total_arc_distance(&self) -> Distance {
        (0..self.num_nodes)
            .flat_map(|from| (0..self.num_nodes).map(move |to| (from, to)))
            .filter(|(from, to)| from != to)
            .map(|(from, to)| self.distances[from * self.num_nodes + to])
            .filter(|distance| distance.is_finite())
            .sum()
    }

    /// Nested representation, unreachable arcs as `None`.
    pub fn nested_times(&self) -> Vec<Vec<Vec<Option<Time>>>> {
        self.times
            .iter()
            .map(|flat| nest(flat, self.num_nodes))
            .collect()
    }

    pub fn nested_distances(&self) -> Vec<Vec<Option<Distance>>> {
        nest(&self.distances, self.num_nodes)
    }
}

fn nest(flat: &[f64], num_nodes: usize) -> Vec<Vec<Option<f64>>> {
    flat.chunks(num_nodes.max(1))
        .map(|row| {
            row.iter()
                .map(|&value| value.is_finite().then_some(value))
                .collect()
        })
        .collect()
}
