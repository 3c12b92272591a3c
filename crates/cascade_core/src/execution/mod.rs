//! Partition-parallel execution.
//!
//! Work is split into one task per store partition. Tasks run on the
//! session's thread pool with no ordering between them. Only once every task
//! has finished do callers get to see the results, and a single failed task
//! fails the whole execution.

pub mod materialize;

use cascade_error::{FunctionError, Result};
use rayon::ThreadPool;
use rayon::prelude::*;
use tracing::warn;

/// Run `f` once for every partition and wait for all of them to complete.
///
/// Results are returned in partition order. If any partition fails, every
/// other partition is still allowed to finish and a single error is returned:
/// the partition's own error if only one failed, otherwise a runtime error
/// summarizing all failures.
pub fn execute_partitions<T, F>(pool: &ThreadPool, num_partitions: usize, f: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(usize) -> Result<T> + Sync,
{
    let results: Vec<Result<T>> =
        pool.install(|| (0..num_partitions).into_par_iter().map(&f).collect());

    let mut outputs = Vec::with_capacity(num_partitions);
    let mut failures = Vec::new();
    for (partition, result) in results.into_iter().enumerate() {
        match result {
            Ok(output) => outputs.push(output),
            Err(e) => {
                warn!(%partition, %e, "partition failed");
                failures.push((partition, e));
            }
        }
    }

    if failures.is_empty() {
        return Ok(outputs);
    }
    if failures.len() == 1 {
        let (_, err) = failures.remove(0);
        return Err(err);
    }

    let (first_partition, first) = &failures[0];
    Err(FunctionError::runtime(format!(
        "{} of {num_partitions} partitions failed, first failure in partition {first_partition}: {first}",
        failures.len(),
    )))
}

#[cfg(test)]
mod tests {
    use cascade_error::ErrorKind;
    use rayon::ThreadPoolBuilder;

    use super::*;

    fn pool() -> ThreadPool {
        ThreadPoolBuilder::new().num_threads(2).build().unwrap()
    }

    #[test]
    fn results_in_partition_order() {
        let out = execute_partitions(&pool(), 8, |p| Ok(p * 2)).unwrap();
        assert_eq!(vec![0, 2, 4, 6, 8, 10, 12, 14], out);
    }

    #[test]
    fn zero_partitions() {
        let out = execute_partitions(&pool(), 0, |p| Ok(p)).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn single_failure_propagates_unchanged() {
        let err = execute_partitions(&pool(), 4, |p| {
            if p == 2 {
                Err(FunctionError::value_error(3, "bad"))
            } else {
                Ok(p)
            }
        })
        .unwrap_err();

        assert_eq!(ErrorKind::Value, err.kind());
        assert_eq!(3, err.index());
    }

    #[test]
    fn multiple_failures_aggregate() {
        let err = execute_partitions(&pool(), 4, |p| {
            if p % 2 == 1 {
                Err(FunctionError::runtime(format!("boom {p}")))
            } else {
                Ok(p)
            }
        })
        .unwrap_err();

        assert_eq!(ErrorKind::Runtime, err.kind());
        assert!(err.message().starts_with("2 of 4 partitions failed"));
        assert!(err.message().contains("partition 1: boom 1"));
    }
}
