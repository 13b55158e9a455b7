pub mod common;
pub mod constants;
pub mod enums;
pub mod header;
pub mod name;
pub mod question;
pub mod resource;


use bitstream_io::{BigEndian, BitWriter};
use common::{PacketComponent, WireCursor};
use constants::MAX_UDP_PAYLOAD;
use enums::{Opcode, ResponseCode};
use header::Header;
use question::Question;
use resource::ResourceRecord;
use tracing::{debug, trace};

use crate::error::{CodecError, Result, Section};

/// Produces the answer records for a response to a standard query.
///
/// An `Err` code is placed in the response header and the answer section is
/// left empty.
pub trait AnswerSupplier {
    fn answers(
        &self,
        questions: &[Question],
    ) -> std::result::Result<Vec<ResourceRecord>, ResponseCode>;
}

impl<F> AnswerSupplier for F
where
    F: Fn(&[Question]) -> std::result::Result<Vec<ResourceRecord>, ResponseCode>,
{
    fn answers(
        &self,
        questions: &[Question],
    ) -> std::result::Result<Vec<ResourceRecord>, ResponseCode> {
        self(questions)
    }
}

fn section_count(section: Section, count: usize) -> Result<u16> {
    u16::try_from(count).map_err(|_| CodecError::TooManyRecords { section, count })
}

/// A DNS message carrying the question and answer sections.
///
/// The header's section counts always describe the carried sections: the
/// question and answer counts are taken from the lists, and the authority and
/// additional counts are zero because those sections are not modelled. A list
/// longer than `u16::MAX` saturates its count and makes `serialize` fail.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Message {
    header: Header,
    questions: Vec<Question>,
    answers: Vec<ResourceRecord>,
}

impl Message {
    pub fn new(header: Header, questions: Vec<Question>, answers: Vec<ResourceRecord>) -> Self {
        let header = Header {
            question_count: section_count(Section::Question, questions.len()).unwrap_or(u16::MAX),
            answer_count: section_count(Section::Answer, answers.len()).unwrap_or(u16::MAX),
            authority_count: 0,
            additional_count: 0,
            ..header
        };
        Message {
            header,
            questions,
            answers,
        }
    }

    /// A standard query with the given id.
    pub fn query(id: u16, recursion_desired: bool, questions: Vec<Question>) -> Self {
        let header = Header {
            id,
            recursion_desired,
            ..Header::default()
        };
        Message::new(header, questions, Vec::new())
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn answers(&self) -> &[ResourceRecord] {
        &self.answers
    }

    pub fn into_parts(self) -> (Header, Vec<Question>, Vec<ResourceRecord>) {
        (self.header, self.questions, self.answers)
    }

    /// Decodes the header, question section and answer section of `buf`.
    ///
    /// Authority and additional records, and anything after the answers, are
    /// ignored. The returned message owns all of its data.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        trace!("Parsing DNS message, size: {} bytes", buf.len());
        let mut cursor = WireCursor::new(buf);
        let header = Header::read(&mut cursor)?;
        debug!(
            "Parsed DNS header: id={}, qr={}, opcode={}, questions={}, answers={}",
            header.id,
            header.is_response,
            header.opcode,
            header.question_count,
            header.answer_count
        );

        let questions = (0..header.question_count as usize)
            .map(|index| {
                Question::read(&mut cursor).map_err(|e| e.in_section(Section::Question, index))
            })
            .collect::<Result<Vec<_>>>()?;

        let answers = (0..header.answer_count as usize)
            .map(|index| {
                ResourceRecord::read(&mut cursor).map_err(|e| e.in_section(Section::Answer, index))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Message::new(header, questions, answers))
    }

    /// Writes the message in wire format.
    ///
    /// Fails if a section holds more records than its 16-bit count can carry.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        section_count(Section::Question, self.questions.len())?;
        section_count(Section::Answer, self.answers.len())?;

        let mut buf = Vec::with_capacity(MAX_UDP_PAYLOAD);
        {
            let mut writer: BitWriter<&mut Vec<u8>, BigEndian> = BitWriter::new(&mut buf);

            self.header.write(&mut writer)?;
            for question in &self.questions {
                question.write(&mut writer)?;
            }
            for answer in &self.answers {
                answer.write(&mut writer)?;
            }
        }
        Ok(buf)
    }

    /// Builds the response to `request`.
    ///
    /// The id, opcode and RD flag are copied and the questions echoed. Only a
    /// standard query consults `supplier`; any other opcode is answered with
    /// `NotImplemented` and no answers.
    pub fn build_response<S>(request: &Message, supplier: &S) -> Message
    where
        S: AnswerSupplier + ?Sized,
    {
        let req = request.header();
        let (response_code, answers) = match Opcode::from(req.opcode) {
            Opcode::Query => match supplier.answers(request.questions()) {
                Ok(answers) => (ResponseCode::NoError, answers),
                Err(code) => (code, Vec::new()),
            },
            _ => (ResponseCode::NotImplemented, Vec::new()),
        };

        let header = Header {
            id: req.id,
            is_response: true,
            opcode: req.opcode,
            recursion_desired: req.recursion_desired,
            response_code: response_code.into(),
            ..Header::default()
        };
        Message::new(header, request.questions.clone(), answers)
    }
}
