//! Peak finding with a minimum height and a minimum peak spacing.

/// Indices of local maxima.
///
/// A sample is a local maximum if it is strictly greater than its left
/// neighbour and strictly greater than the first differing sample to its
/// right. A flat top of several equal samples is reported once, at its
/// middle sample (the lower middle for even widths). The first and last
/// samples are never maxima.
pub fn local_maxima(x: &[f64]) -> Vec<usize> {
    let mut midpoints = Vec::new();
    if x.len() < 3 {
        return midpoints;
    }

    let i_max = x.len() - 1;
    let mut i = 1;
    while i < i_max {
        if x[i - 1] < x[i] {
            let mut i_ahead = i + 1;
            while i_ahead < i_max && x[i_ahead] == x[i] {
                i_ahead += 1;
            }
            if x[i_ahead] < x[i] {
                let left_edge = i;
                let right_edge = i_ahead - 1;
                midpoints.push((left_edge + right_edge) / 2);
                i = i_ahead;
            }
        }
        i += 1;
    }
    midpoints
}

/// Thin out peaks closer than `distance` samples to a higher peak.
///
/// Peaks are visited from highest to lowest; each kept peak removes every
/// not-yet-visited peak within `distance - 1` samples on either side. Among
/// equally high peaks the later index is visited first. Returns the kept
/// peaks in ascending order.
pub fn select_by_distance(peaks: &[usize], heights: &[f64], distance: usize) -> Vec<usize> {
    debug_assert_eq!(peaks.len(), heights.len());
    let n = peaks.len();
    let mut keep = vec![true; n];

    // Stable ascending sort, walked from the back
    let mut priority: Vec<usize> = (0..n).collect();
    priority.sort_by(|&a, &b| heights[a].total_cmp(&heights[b]));

    for &j in priority.iter().rev() {
        if !keep[j] {
            continue;
        }

        let mut k = j;
        while k > 0 && peaks[j] - peaks[k - 1] < distance {
            keep[k - 1] = false;
            k -= 1;
        }

        let mut k = j + 1;
        while k < n && peaks[k] - peaks[j] < distance {
            keep[k] = false;
            k += 1;
        }
    }

    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&p, kept)| kept.then_some(p))
        .collect()
}

/// Find peaks of at least `height` separated by at least `distance` samples.
pub fn find_peaks(x: &[f64], height: f64, distance: usize) -> Vec<usize> {
    let candidates: Vec<usize> = local_maxima(x)
        .into_iter()
        .filter(|&i| x[i] >= height)
        .collect();

    if distance <= 1 {
        return candidates;
    }

    let heights: Vec<f64> = candidates.iter().map(|&i| x[i]).collect();
    select_by_distance(&candidates, &heights, distance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_maxima() {
        let x = [0.0, 2.0, 1.0, 3.0, 0.0];
        assert_eq!(local_maxima(&x), vec![1, 3]);
    }

    #[test]
    fn test_edges_are_not_maxima() {
        let x = [5.0, 1.0, 0.0, 1.0, 5.0];
        assert!(local_maxima(&x).is_empty());
        assert!(local_maxima(&[1.0, 2.0]).is_empty());
    }

    #[test]
    fn test_plateau_midpoint() {
        // Odd-width plateau: centre
        assert_eq!(local_maxima(&[0.0, 1.0, 1.0, 1.0, 0.0]), vec![2]);
        // Even-width plateau: lower middle
        assert_eq!(local_maxima(&[0.0, 1.0, 1.0, 0.0]), vec![1]);
        // Plateau running into the last sample is not a peak
        assert!(local_maxima(&[0.0, 1.0, 1.0, 1.0]).is_empty());
        // Shoulder (plateau then rise) is not a peak
        assert_eq!(local_maxima(&[0.0, 1.0, 1.0, 2.0, 0.0]), vec![3]);
    }

    #[test]
    fn test_height_filter() {
        let x = [0.0, 2.0, 0.0, 5.0, 0.0, 3.0, 0.0];
        assert_eq!(find_peaks(&x, 3.0, 1), vec![3, 5]);
        assert_eq!(find_peaks(&x, -100.0, 1), vec![1, 3, 5]);
        assert!(find_peaks(&x, 100.0, 1).is_empty());
    }

    #[test]
    fn test_distance_keeps_highest() {
        let x = [0.0, 2.0, 0.0, 5.0, 0.0, 3.0, 0.0, 0.0, 4.0, 0.0];
        // 3 suppresses 1 and 5; 8 is far enough away
        assert_eq!(find_peaks(&x, 0.0, 3), vec![3, 8]);
    }

    #[test]
    fn test_distance_tie_prefers_later_peak() {
        let x = [0.0, 1.0, 0.0, 1.0, 1.0, 0.0];
        assert_eq!(local_maxima(&x), vec![1, 3]);
        assert_eq!(find_peaks(&x, 0.0, 3), vec![3]);
    }

    #[test]
    fn test_suppressed_peak_does_not_suppress() {
        // 4 removes 2 and 6; 8 is within range of the removed 6 but stays
        let peaks = [2, 4, 6, 8];
        let heights = [1.0, 5.0, 2.0, 1.0];
        assert_eq!(select_by_distance(&peaks, &heights, 3), vec![4, 8]);
    }
}
