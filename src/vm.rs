//! The per-cell interpreter: fetch-mutate-execute over a packed 4-bit
//! codon genome, plus the interactions (KILL, SHARE, offspring commit) it
//! drives through the pond.
//!
//! This is the hot path of the whole simulator (§2 budgets it at roughly
//! half the core); the one deliberate micro-optimization kept from the
//! reference design is the "current-word cache" (`cur_word`): the `u64`
//! backing the execution cursor's word is held in a local and only
//! refreshed when the cursor moves to a different word or that word is
//! mutated in place, instead of re-reading it from the genome on every
//! codon fetch.

use crate::cell::CODONS_PER_WORD;
use crate::cell::Genome;
use crate::interaction::{access_allowed, Sense};
use crate::pond::Direction;
use crate::scheduler::World;

/// Word width in bits (one `u64` genome word).
const WORD_BITS: u32 = 64;
/// Bit width of a codon.
const CODON_BITS: u32 = 4;
/// Execution cursor's starting word: skips the reserved "logo" codon.
const EXEC_START_WORD: usize = 0;
/// Execution cursor's starting bit offset within `EXEC_START_WORD`.
const EXEC_START_BIT: u32 = 4;

/// Per-execution VM registers. Not persisted between cell executions.
pub struct Vm {
    exec_word: usize,
    exec_shift: u32,
    ptr_word: usize,
    ptr_shift: u32,
    reg: u8,
    facing: u8,
    output_buf: Genome,
    loop_stack: Vec<(usize, u32)>,
    false_loop_depth: u32,
    stop: bool,
    cur_word: u64,
}

impl Vm {
    fn new(depth: usize, first_word: u64) -> Self {
        Vm {
            exec_word: EXEC_START_WORD,
            exec_shift: EXEC_START_BIT,
            ptr_word: 0,
            ptr_shift: 0,
            reg: 0,
            facing: 0,
            output_buf: Genome::blank(depth),
            loop_stack: Vec::new(),
            false_loop_depth: 0,
            stop: false,
            cur_word: first_word,
        }
    }

    #[inline]
    fn fetch(&self) -> u8 {
        ((self.cur_word >> self.exec_shift) & 0xf) as u8
    }

    /// Patch the bit range `[shift, shift+4)` of the cached word in place;
    /// used when a mutation or WRITEG touches the word the execution cursor
    /// is currently parked on.
    #[inline]
    fn patch_cur_word(&mut self, shift: u32, value: u8) {
        let mask = 0xfu64 << shift;
        self.cur_word = (self.cur_word & !mask) | (((value & 0xf) as u64) << shift);
    }

    /// Advance `(word, shift)` by one codon, wrapping a word-boundary
    /// overflow to the next word and a genome overflow back to
    /// `(EXEC_START_WORD, EXEC_START_BIT)`.
    fn advance(word: &mut usize, shift: &mut u32, word_count: usize) {
        *shift += CODON_BITS;
        if *shift >= WORD_BITS {
            *word += 1;
            if *word >= word_count {
                *word = EXEC_START_WORD;
                *shift = EXEC_START_BIT;
            } else {
                *shift = 0;
            }
        }
    }

    fn advance_exec_cursor(&mut self, word_count: usize) {
        Self::advance(&mut self.exec_word, &mut self.exec_shift, word_count);
    }

    fn advance_ptr_fwd(&mut self, word_count: usize) {
        self.ptr_shift += CODON_BITS;
        if self.ptr_shift >= WORD_BITS {
            self.ptr_shift = 0;
            self.ptr_word = (self.ptr_word + 1) % word_count;
        }
    }

    fn advance_ptr_back(&mut self, word_count: usize) {
        if self.ptr_shift == 0 {
            self.ptr_shift = WORD_BITS - CODON_BITS;
            self.ptr_word = (self.ptr_word + word_count - 1) % word_count;
        } else {
            self.ptr_shift -= CODON_BITS;
        }
    }
}

/// Run one cell's VM to completion (`energy == 0` or `stop`), applying
/// mutation, dispatch, interactions, and the closing offspring commit.
///
/// `world` owns the pond, PRNG, id counter, and statistics; `(x, y)` selects
/// the acting cell, `mutation_rate`/`failed_kill_penalty` come from
/// [`crate::config::Config`].
pub fn execute(world: &mut World, x: usize, y: usize, mutation_rate: u64, failed_kill_penalty: u64) {
    let word_count = world.pond.get(x, y).genome.word_count();
    let depth = word_count * CODONS_PER_WORD;
    let first_word = world.pond.get(x, y).genome.word(EXEC_START_WORD);
    let mut vm = Vm::new(depth, first_word);

    loop {
        if world.pond.get(x, y).energy == 0 || vm.stop {
            break;
        }

        // --- fetch + mutate + energy debit (steps 1-3) -----------------
        let codon = {
            let mut codon = vm.fetch();
            let draw = world.prng.next_u64();
            if (draw & 0xFFFF_FFFF) < mutation_rate {
                let replacement = (draw & 0xf) as u8;
                if (draw >> 8) & 1 == 0 {
                    let cell = world.pond.get_mut(x, y);
                    cell.genome.set_codon(vm.exec_word, vm.exec_shift, replacement);
                    vm.patch_cur_word(vm.exec_shift, replacement);
                    codon = replacement;
                    tracing::trace!(target: "sim.vm", x, y, replacement, "codon_mutation");
                } else {
                    vm.reg = replacement;
                    tracing::trace!(target: "sim.vm", x, y, replacement, "register_mutation");
                }
            }
            let cell = world.pond.get_mut(x, y);
            cell.energy -= 1;
            codon
        };

        // --- dispatch (steps 4-5) ---------------------------------------
        let mut restarted = false;
        if vm.false_loop_depth > 0 {
            match codon {
                0x9 => vm.false_loop_depth += 1,
                0xa => vm.false_loop_depth -= 1,
                _ => {}
            }
        } else {
            world.stats.instr[codon as usize] += 1;
            match codon {
                0x0 => {
                    // ZERO
                    vm.reg = 0;
                    vm.ptr_word = 0;
                    vm.ptr_shift = 0;
                    vm.facing = 0;
                }
                0x1 => vm.advance_ptr_fwd(word_count), // FWD
                0x2 => vm.advance_ptr_back(word_count), // BACK
                0x3 => vm.reg = (vm.reg + 1) & 0xf,     // INC
                0x4 => vm.reg = vm.reg.wrapping_sub(1) & 0xf, // DEC
                0x5 => {
                    // READG
                    vm.reg = world.pond.get(x, y).genome.codon(vm.ptr_word, vm.ptr_shift);
                }
                0x6 => {
                    // WRITEG
                    let reg = vm.reg;
                    let cell = world.pond.get_mut(x, y);
                    cell.genome.set_codon(vm.ptr_word, vm.ptr_shift, reg);
                    if vm.ptr_word == vm.exec_word {
                        vm.patch_cur_word(vm.ptr_shift, reg);
                    }
                }
                0x7 => {
                    // READB
                    vm.reg = vm.output_buf.codon(vm.ptr_word, vm.ptr_shift);
                }
                0x8 => {
                    // WRITEB
                    let reg = vm.reg;
                    vm.output_buf.set_codon(vm.ptr_word, vm.ptr_shift, reg);
                }
                0x9 => {
                    // LOOP
                    if vm.reg != 0 {
                        if vm.loop_stack.len() >= depth {
                            vm.stop = true;
                        } else {
                            vm.loop_stack.push((vm.exec_word, vm.exec_shift));
                        }
                    } else {
                        vm.false_loop_depth = 1;
                    }
                }
                0xa => {
                    // REP
                    if let Some((w, s)) = vm.loop_stack.pop() {
                        if vm.reg != 0 {
                            vm.exec_word = w;
                            vm.exec_shift = s;
                            vm.cur_word = world.pond.get(x, y).genome.word(vm.exec_word);
                            restarted = true;
                        }
                    }
                }
                0xb => vm.facing = vm.reg & 3, // TURN
                0xc => {
                    // XCHG: the cursor advance here is the codon's own
                    // semantic effect, independent of the usual step-6
                    // advance that still follows it below.
                    vm.advance_exec_cursor(word_count);
                    vm.cur_word = world.pond.get(x, y).genome.word(vm.exec_word);
                    let old = ((vm.cur_word >> vm.exec_shift) & 0xf) as u8;
                    let reg = vm.reg;
                    let cell = world.pond.get_mut(x, y);
                    cell.genome.set_codon(vm.exec_word, vm.exec_shift, reg);
                    vm.patch_cur_word(vm.exec_shift, reg);
                    vm.reg = old;
                }
                0xd => {
                    // KILL. Allocate the id up front via the `next_id` field
                    // projection: `me`/`neighbor` below hold a live borrow of
                    // `world.pond`, and a `&mut self` call like
                    // `world.alloc_id()` would conflict with it even though
                    // the two never actually touch the same data.
                    let fresh = crate::scheduler::alloc_id(&mut world.next_id);
                    let dir = Direction::from_facing(vm.facing);
                    let (me, neighbor) = world.pond.split_pair_mut(x, y, dir);
                    if access_allowed(neighbor, vm.reg, Sense::Negative, &mut world.prng) {
                        if neighbor.is_viable() {
                            world.stats.viable_killed += 1;
                        }
                        neighbor.reinit_as_root(fresh);
                    } else if neighbor.is_viable() {
                        me.energy = me.energy.saturating_sub(me.energy / failed_kill_penalty);
                    }
                }
                0xe => {
                    // SHARE
                    let dir = Direction::from_facing(vm.facing);
                    let (me, neighbor) = world.pond.split_pair_mut(x, y, dir);
                    if access_allowed(neighbor, vm.reg, Sense::Positive, &mut world.prng) {
                        if neighbor.is_viable() {
                            world.stats.viable_shares += 1;
                        }
                        let total = me.energy + neighbor.energy;
                        neighbor.energy = total / 2;
                        me.energy = total - neighbor.energy;
                    }
                }
                0xf => vm.stop = true, // STOP
                _ => unreachable!("codon is masked to 4 bits"),
            }
        }

        // --- cursor advance (step 6) -------------------------------------
        if !restarted {
            let prev_word = vm.exec_word;
            vm.advance_exec_cursor(word_count);
            if vm.exec_word != prev_word {
                vm.cur_word = world.pond.get(x, y).genome.word(vm.exec_word);
            }
        }
    }

    // --- offspring commit -------------------------------------------------
    // Trigger is `output_buf[0] & 0xff != 0xff` (§4.3): the first two codons
    // only, not `head_is_blank`'s two whole words — that method is the
    // KILL-blank check (§4.3 KILL, §8), a different and much wider scope.
    if vm.output_buf.header_written() {
        // Allocate before `split_pair_mut` for the same borrow-disjointness
        // reason as the KILL arm above.
        let fresh = crate::scheduler::alloc_id(&mut world.next_id);
        let dir = Direction::from_facing(vm.facing);
        let (me, neighbor) = world.pond.split_pair_mut(x, y, dir);
        if neighbor.is_alive() && access_allowed(neighbor, vm.reg, Sense::Negative, &mut world.prng) {
            if neighbor.is_viable() {
                world.stats.viable_replaced += 1;
            }
            neighbor.commit_offspring(fresh, me, vm.output_buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::scheduler::World;

    fn world_with_cell(depth: usize, fill: impl Fn(&mut crate::cell::Cell)) -> (World, Config) {
        let cfg = Config {
            pond_size_x: 3,
            pond_size_y: 3,
            pond_depth: depth,
            ..Config::default()
        };
        let mut world = World::new(&cfg);
        fill(world.pond.get_mut(1, 1));
        (world, cfg)
    }

    #[test]
    fn all_stop_genome_executes_exactly_one_instruction() {
        let (mut world, cfg) = world_with_cell(32, |c| {
            c.energy = 5;
            for w in 0..c.genome.word_count() {
                c.genome.set_word(w, u64::MAX); // all codons 0xf = STOP
            }
        });
        execute(&mut world, 1, 1, 0, cfg.failed_kill_penalty);
        assert_eq!(world.pond.get(1, 1).energy, 4);
        assert_eq!(world.stats.instr[0xf], 1);
        // Emits nothing: the output buffer was never written, so no
        // offspring commit fires and the neighbor facing=0 (Left of (1,1)
        // in a 3-wide pond is (0,1)) stays the untouched default slot.
        let neighbor = world.pond.get(0, 1);
        assert_eq!(neighbor.id, 0);
        assert_eq!(neighbor.energy, 0);
        assert_eq!(neighbor.generation, 0);
    }

    #[test]
    fn all_zero_genome_runs_until_energy_exhausted() {
        let (mut world, cfg) = world_with_cell(32, |c| {
            c.energy = 7;
            for w in 0..c.genome.word_count() {
                c.genome.set_word(w, 0); // all codons 0x0 = ZERO
            }
        });
        execute(&mut world, 1, 1, 0, cfg.failed_kill_penalty);
        assert_eq!(world.pond.get(1, 1).energy, 0);
        assert_eq!(world.stats.instr[0x0], 7);
    }

    #[test]
    fn energy_one_runs_exactly_one_step() {
        let (mut world, cfg) = world_with_cell(32, |c| {
            c.energy = 1;
            for w in 0..c.genome.word_count() {
                c.genome.set_word(w, 0);
            }
        });
        execute(&mut world, 1, 1, 0, cfg.failed_kill_penalty);
        assert_eq!(world.pond.get(1, 1).energy, 0);
        assert_eq!(world.stats.cell_executions, 0); // scheduler increments this, not execute()
        assert_eq!(world.stats.instr.iter().sum::<u64>(), 1);
    }

    #[test]
    fn writeg_then_readg_roundtrips() {
        // Program at exec cursor (word0 shift4..): FWD(skip target slot via ptr start at 0,
        // but ptr already starts at (0,0) so no FWD needed), set reg via INC x5, WRITEG, ZERO is
        // avoided since it would clear ptr; instead: INC*5, WRITEG, READG would read back same
        // cell - but READG reads ptr which WRITEG just wrote, so expect reg==5 after READG even
        // though WRITEG doesn't clear reg.
        let (mut world, cfg) = world_with_cell(32, |c| {
            c.energy = 20;
            c.genome.blank_all();
            // word0 bits: shift0 (skipped logo) = INC(0x3), shift4..: INC,INC,INC,INC,INC,WRITEG,READG,STOP
            c.genome.set_codon(0, 4, 0x3); // INC -> reg=1
            c.genome.set_codon(0, 8, 0x3); // INC -> reg=2
            c.genome.set_codon(0, 12, 0x3); // INC -> reg=3
            c.genome.set_codon(0, 16, 0x6); // WRITEG at ptr(0,0) <- reg(3)
            c.genome.set_codon(0, 20, 0x0); // ZERO -> reg=0, ptr=(0,0)
            c.genome.set_codon(0, 24, 0x5); // READG -> reg = genome(0,0) = 3
            c.genome.set_codon(0, 28, 0xf); // STOP
        });
        execute(&mut world, 1, 1, 0, cfg.failed_kill_penalty);
        assert_eq!(world.pond.get(1, 1).genome.codon(0, 0), 3);
    }

    #[test]
    fn loop_with_zero_reg_skips_to_matching_rep() {
        let (mut world, cfg) = world_with_cell(32, |c| {
            c.energy = 50;
            c.genome.blank_all();
            // shift4: ZERO (reg=0), shift8: LOOP (reg==0 -> skip), shift12: INC (skipped),
            // shift16: REP (pops nothing since no push happened -> no-op, but false_loop_depth
            // decrements to 0 here), shift20: INC (executes, reg=1), shift24: STOP
            c.genome.set_codon(0, 4, 0x0); // ZERO
            c.genome.set_codon(0, 8, 0x9); // LOOP (reg=0 -> begin skip)
            c.genome.set_codon(0, 12, 0x3); // INC (must be skipped)
            c.genome.set_codon(0, 16, 0xa); // REP (ends skip)
            c.genome.set_codon(0, 20, 0x3); // INC (must execute, reg 0->1)
            c.genome.set_codon(0, 24, 0xf); // STOP
        });
        execute(&mut world, 1, 1, 0, cfg.failed_kill_penalty);
        // the skipped INC must not have incremented reg twice; only one INC took effect,
        // observable indirectly via instr counts: INC executed exactly once.
        assert_eq!(world.stats.instr[0x3], 1);
    }

    #[test]
    fn rep_with_empty_stack_is_noop() {
        let (mut world, cfg) = world_with_cell(32, |c| {
            c.energy = 10;
            c.genome.blank_all();
            c.genome.set_codon(0, 4, 0xa); // REP with nothing on the stack
            c.genome.set_codon(0, 8, 0xf); // STOP
        });
        execute(&mut world, 1, 1, 0, cfg.failed_kill_penalty);
        assert_eq!(world.stats.instr[0xa], 1);
        assert_eq!(world.stats.instr[0xf], 1);
    }
}
