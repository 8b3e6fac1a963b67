//! IC-card management. Adding a card is a two-phase flow: the lock first
//! acknowledges "enter add mode", then pushes a second, unsolicited frame
//! once a card has been presented to the reader.

use super::{pack_date5, read_compact_id, read_u16_be, read_u32_be, ResponsePrefix};
use num_enum::{FromPrimitive, IntoPrimitive};

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum IcCardOp {
    Search = 0x01,
    Add = 0x02,
    Delete = 0x03,
    Clear = 0x04,
    Modify = 0x05,

    #[num_enum(catch_all)]
    Unknown(u8),
}

// num_enum's catch_all claims the `default` attribute, so this is spelled
// out by hand.
impl Default for IcCardOp {
    fn default() -> Self {
        IcCardOp::Search
    }
}

/// Where an add flow currently stands, as reported by one response frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcAddState {
    /// Reader armed; waiting for a card to be presented.
    EnterAddMode,
    /// Terminal: the card was registered under this identifier.
    Added(u64),
}

/// One stored card as returned by the paginated search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IcCardRecord {
    pub card_id: u32,
    pub start: [u8; 5],
    pub end: [u8; 5],
}

/// 14-byte search record: id(4) + start(5) + end(5).
const SEARCH_RECORD_LEN: usize = 14;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IcCardCommand {
    pub op: IcCardOp,
    pub card_id: Option<u64>,
    pub window: Option<((u8, u8, u8, u8, u8), (u8, u8, u8, u8, u8))>,
    /// Page cursor for search requests.
    pub sequence: u16,

    pub add_state: Option<IcAddState>,
    pub cards: Vec<IcCardRecord>,
    pub next_sequence: u16,
    pub(crate) prefix: Option<ResponsePrefix>,
}

impl IcCardCommand {
    pub fn build(&self) -> Vec<u8> {
        let mut buf = vec![self.op.into()];
        match self.op {
            IcCardOp::Add | IcCardOp::Clear => {}
            IcCardOp::Search => buf.extend_from_slice(&self.sequence.to_be_bytes()),
            IcCardOp::Delete => match self.card_id {
                Some(id) => super::push_compact_id(&mut buf, id),
                None => return Vec::new(),
            },
            IcCardOp::Modify => {
                let (Some(id), Some((start, end))) = (self.card_id, self.window) else {
                    return Vec::new();
                };
                super::push_compact_id(&mut buf, id);
                let (y, mo, d, h, mi) = start;
                buf.extend_from_slice(&pack_date5(y, mo, d, h, mi));
                let (y, mo, d, h, mi) = end;
                buf.extend_from_slice(&pack_date5(y, mo, d, h, mi));
            }
            IcCardOp::Unknown(_) => return Vec::new(),
        }
        buf
    }

    /// Response: `[battery][status][op echo][fields...]`. For the add flow
    /// an empty remainder means "enter add mode" and a 4- or 8-byte
    /// remainder carries the new card's identifier. Search responses are
    /// `[total u8][next_sequence u16][14-byte records...]`.
    pub fn decode(&mut self, data: &[u8]) {
        let Some((prefix, rest)) = ResponsePrefix::split(data) else {
            return;
        };
        self.prefix = Some(prefix);
        let Some((&op, rest)) = rest.split_first() else {
            return;
        };
        match IcCardOp::from_primitive(op) {
            IcCardOp::Add => {
                self.add_state = if rest.is_empty() {
                    Some(IcAddState::EnterAddMode)
                } else {
                    read_compact_id(rest).map(IcAddState::Added)
                };
            }
            IcCardOp::Search => self.decode_search(rest),
            _ => {}
        }
    }

    fn decode_search(&mut self, data: &[u8]) {
        let Some((&total, rest)) = data.split_first() else {
            return;
        };
        let Some(next) = read_u16_be(rest, 0) else {
            return;
        };
        self.next_sequence = next;
        let mut cursor = &rest[2..];
        while cursor.len() >= SEARCH_RECORD_LEN && self.cards.len() < total as usize {
            let card_id = match read_u32_be(cursor, 0) {
                Some(id) => id,
                None => break,
            };
            let mut start = [0u8; 5];
            start.copy_from_slice(&cursor[4..9]);
            let mut end = [0u8; 5];
            end.copy_from_slice(&cursor[9..14]);
            self.cards.push(IcCardRecord { card_id, start, end });
            cursor = &cursor[SEARCH_RECORD_LEN..];
        }
    }
}
