#![allow(dead_code)]

use dmg_sound::{
    ApuRegisters, BankId, BankedMemory, Rom, SoundHardware, SoundSystem, TrackAddress, TrackEntry,
    TrackTable, TrackerEngine,
};

pub const TRACK_COUNT: u8 = 8;
pub const TABLE_BANK: BankId = BankId(2);
pub const CALLER_BANK: BankId = BankId(3);

/// One call made to a tracker engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCall {
    Start {
        track: TrackAddress,
        bank: BankId,
        channels: u8,
    },
    SetLoop(bool),
    Stop,
    Tick,
}

/// Engine that records every call and disturbs the bank selection on tick
#[derive(Debug, Default)]
pub struct RecordingEngine {
    calls: Vec<EngineCall>,
    bank: BankId,
    playing: bool,
}

impl RecordingEngine {
    pub fn calls(&self) -> &[EngineCall] {
        &self.calls
    }

    pub fn count(&self, pred: impl Fn(&EngineCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(*c)).count()
    }

    pub fn starts(&self) -> usize {
        self.count(|c| matches!(c, EngineCall::Start { .. }))
    }

    pub fn ticks(&self) -> usize {
        self.count(|c| matches!(c, EngineCall::Tick))
    }

    pub fn stops(&self) -> usize {
        self.count(|c| matches!(c, EngineCall::Stop))
    }
}

impl TrackerEngine for RecordingEngine {
    fn start(&mut self, track: TrackAddress, bank: BankId, channels: u8) {
        self.calls.push(EngineCall::Start {
            track,
            bank,
            channels,
        });
        self.bank = bank;
        self.playing = true;
    }

    fn set_loop(&mut self, enabled: bool) {
        self.calls.push(EngineCall::SetLoop(enabled));
    }

    fn stop(&mut self, _hw: &mut dyn SoundHardware) {
        self.calls.push(EngineCall::Stop);
        self.playing = false;
    }

    fn tick(&mut self, memory: &mut dyn BankedMemory, _hw: &mut dyn SoundHardware) {
        self.calls.push(EngineCall::Tick);
        if self.playing {
            memory.read_banked_u8(self.bank, 0x4000);
        }
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

/// Bank of track `index` in the fixture ROM
pub fn track_bank(index: u8) -> BankId {
    BankId(4 + index % 4)
}

/// Data address of track `index` in the fixture ROM
pub fn track_addr(index: u8) -> u16 {
    0x4000 + 0x200 * index as u16
}

/// 8-bank ROM with an 8-track table in bank 2, the caller bank pushed
pub fn fixture_rom() -> (Rom, TrackTable) {
    let mut rom = Rom::new(8).unwrap();
    let entries: Vec<TrackEntry> = (0..TRACK_COUNT)
        .map(|i| TrackEntry::new(track_bank(i), track_addr(i)))
        .collect();
    let tracks = TrackTable::author(&mut rom, TABLE_BANK, 0x4000, &entries).unwrap();
    rom.push_bank(CALLER_BANK);
    (rom, tracks)
}

pub fn recording_system() -> SoundSystem<Rom, ApuRegisters, RecordingEngine> {
    let (rom, tracks) = fixture_rom();
    SoundSystem::new(rom, ApuRegisters::new(), tracks, RecordingEngine::default())
}
