use crate::Error;

use super::AlgorithmTopology;

// -------------------------------------------------------------------------------------------------

/// One DX7 algorithm with 1-based operator numbers, as printed on the DX7 front panel.
struct Dx7Algorithm {
    carriers: &'static [usize],
    /// (modulator, target) pairs.
    modulations: &'static [(usize, usize)],
    /// (source, target) of the feedback loop.
    feedback: (usize, usize),
}

const fn entry(
    carriers: &'static [usize],
    modulations: &'static [(usize, usize)],
    feedback: (usize, usize),
) -> Dx7Algorithm {
    Dx7Algorithm {
        carriers,
        modulations,
        feedback,
    }
}

#[rustfmt::skip]
const ALGORITHMS: [Dx7Algorithm; 32] = [
    // 1: 2→1, 6→5→4→3 (6↻)
    entry(&[1, 3], &[(2, 1), (4, 3), (5, 4), (6, 5)], (6, 6)),
    // 2: 2→1, 6→5→4→3 (2↻)
    entry(&[1, 3], &[(2, 1), (4, 3), (5, 4), (6, 5)], (2, 2)),
    // 3: 3→2→1, 6→5→4 (6↻)
    entry(&[1, 4], &[(2, 1), (3, 2), (5, 4), (6, 5)], (6, 6)),
    // 4: 3→2→1, 6→5→4 (4→6)
    entry(&[1, 4], &[(2, 1), (3, 2), (5, 4), (6, 5)], (4, 6)),
    // 5: 2→1, 4→3, 6→5 (6↻)
    entry(&[1, 3, 5], &[(2, 1), (4, 3), (6, 5)], (6, 6)),
    // 6: 2→1, 4→3, 6→5 (5→6)
    entry(&[1, 3, 5], &[(2, 1), (4, 3), (6, 5)], (5, 6)),
    // 7: 2→1, 4→3, 6→5→3 (6↻)
    entry(&[1, 3], &[(2, 1), (4, 3), (5, 3), (6, 5)], (6, 6)),
    // 8: 2→1, 4→3, 6→5→3 (4↻)
    entry(&[1, 3], &[(2, 1), (4, 3), (5, 3), (6, 5)], (4, 4)),
    // 9: 2→1, 4→3, 6→5→3 (2↻)
    entry(&[1, 3], &[(2, 1), (4, 3), (5, 3), (6, 5)], (2, 2)),
    // 10: 3→2→1, 5→4, 6→4 (3↻)
    entry(&[1, 4], &[(2, 1), (3, 2), (5, 4), (6, 4)], (3, 3)),
    // 11: 3→2→1, 5→4, 6→4 (6↻)
    entry(&[1, 4], &[(2, 1), (3, 2), (5, 4), (6, 4)], (6, 6)),
    // 12: 2→1, 4→3, 5→3, 6→3 (2↻)
    entry(&[1, 3], &[(2, 1), (4, 3), (5, 3), (6, 3)], (2, 2)),
    // 13: 2→1, 4→3, 5→3, 6→3 (6↻)
    entry(&[1, 3], &[(2, 1), (4, 3), (5, 3), (6, 3)], (6, 6)),
    // 14: 2→1, 5→4→3, 6→4 (6↻)
    entry(&[1, 3], &[(2, 1), (4, 3), (5, 4), (6, 4)], (6, 6)),
    // 15: 2→1, 5→4→3, 6→4 (2↻)
    entry(&[1, 3], &[(2, 1), (4, 3), (5, 4), (6, 4)], (2, 2)),
    // 16: 2→1, 4→3→1, 6→5→1 (6↻)
    entry(&[1], &[(2, 1), (3, 1), (4, 3), (5, 1), (6, 5)], (6, 6)),
    // 17: 2→1, 4→3→1, 6→5→1 (2↻)
    entry(&[1], &[(2, 1), (3, 1), (4, 3), (5, 1), (6, 5)], (2, 2)),
    // 18: 2→1, 3→1, 6→5→4→1 (3↻)
    entry(&[1], &[(2, 1), (3, 1), (4, 1), (5, 4), (6, 5)], (3, 3)),
    // 19: 3→2→1, 6→4, 6→5 (6↻)
    entry(&[1, 4, 5], &[(2, 1), (3, 2), (6, 4), (6, 5)], (6, 6)),
    // 20: 3→1, 3→2, 5→4, 6→4 (3↻)
    entry(&[1, 2, 4], &[(3, 1), (3, 2), (5, 4), (6, 4)], (3, 3)),
    // 21: 3→1, 3→2, 6→4, 6→5 (3↻)
    entry(&[1, 2, 4, 5], &[(3, 1), (3, 2), (6, 4), (6, 5)], (3, 3)),
    // 22: 2→1, 6→3, 6→4, 6→5 (6↻)
    entry(&[1, 3, 4, 5], &[(2, 1), (6, 3), (6, 4), (6, 5)], (6, 6)),
    // 23: 3→2, 6→4, 6→5 (6↻)
    entry(&[1, 2, 4, 5], &[(3, 2), (6, 4), (6, 5)], (6, 6)),
    // 24: 6→3, 6→4, 6→5 (6↻)
    entry(&[1, 2, 3, 4, 5], &[(6, 3), (6, 4), (6, 5)], (6, 6)),
    // 25: 6→4, 6→5 (6↻)
    entry(&[1, 2, 3, 4, 5], &[(6, 4), (6, 5)], (6, 6)),
    // 26: 3→2, 5→4, 6→4 (6↻)
    entry(&[1, 2, 4], &[(3, 2), (5, 4), (6, 4)], (6, 6)),
    // 27: 3→2, 5→4, 6→4 (3↻)
    entry(&[1, 2, 4], &[(3, 2), (5, 4), (6, 4)], (3, 3)),
    // 28: 2→1, 5→4→3 (5↻)
    entry(&[1, 3, 6], &[(2, 1), (4, 3), (5, 4)], (5, 5)),
    // 29: 4→3, 6→5 (6↻)
    entry(&[1, 2, 3, 5], &[(4, 3), (6, 5)], (6, 6)),
    // 30: 5→4→3 (5↻)
    entry(&[1, 2, 3, 6], &[(4, 3), (5, 4)], (5, 5)),
    // 31: 6→5 (6↻)
    entry(&[1, 2, 3, 4, 5], &[(6, 5)], (6, 6)),
    // 32: all carriers (6↻)
    entry(&[1, 2, 3, 4, 5, 6], &[], (6, 6)),
];

// -------------------------------------------------------------------------------------------------

/// Builds the topology of the given 1-based DX7 algorithm number.
pub(super) fn algorithm(number: u8) -> Result<AlgorithmTopology, Error> {
    let index = (number as usize).wrapping_sub(1);
    let Some(algorithm) = ALGORITHMS.get(index) else {
        return Err(Error::InvalidTopology(format!(
            "DX7 algorithm number must be in range [1, 32], but is {number}"
        )));
    };
    let mut topology = AlgorithmTopology::new(6)
        .with_carriers(algorithm.carriers.iter().map(|carrier| carrier - 1))
        .with_feedback(algorithm.feedback.0 - 1, algorithm.feedback.1 - 1);
    for (modulator, target) in algorithm.modulations {
        topology = topology.with_modulation(modulator - 1, target - 1);
    }
    Ok(topology)
}

// -------------------------------------------------------------------------------------------------
