/// Shorten token sequences until their combined length fits `max_len`.
///
/// Each round drops the first token of the longest sequence (the earliest
/// one on ties), so the most recent end of every sequence survives longest.
pub fn truncate_multiple_sequences(seqs: &mut [Vec<u32>], max_len: usize) {
    let mut total: usize = seqs.iter().map(Vec::len).sum();
    let mut dropped = vec![0usize; seqs.len()];

    while total > max_len {
        let mut longest = 0;
        for (i, seq) in seqs.iter().enumerate() {
            if seq.len() - dropped[i] > seqs[longest].len() - dropped[longest] {
                longest = i;
            }
        }
        dropped[longest] += 1;
        total -= 1;
    }

    // Remove the counted prefixes in one pass per sequence.
    for (seq, n) in seqs.iter_mut().zip(dropped) {
        seq.drain(..n);
    }
}
