use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::DnsConfig;
use crate::dns::{
    AnswerSupplier, Message,
    constants::MAX_UDP_PAYLOAD,
    enums::{Opcode, RecordClass, RecordType, ResponseCode},
    header::Header,
    question::Question,
    resource::ResourceRecord,
};
use crate::error::ResolveError;

/// Answers every `IN A` question with one fixed address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticAnswers {
    pub address: Ipv4Addr,
    pub ttl: u32,
}

impl Default for StaticAnswers {
    fn default() -> Self {
        StaticAnswers {
            address: Ipv4Addr::new(8, 8, 8, 8),
            ttl: 60,
        }
    }
}

impl AnswerSupplier for StaticAnswers {
    /// Fails with `NotImplemented` as soon as one question is not `IN A`.
    fn answers(&self, questions: &[Question]) -> Result<Vec<ResourceRecord>, ResponseCode> {
        questions
            .iter()
            .map(|question| {
                if question.qtype != RecordType::A || question.qclass != RecordClass::IN {
                    debug!("No synthetic answer for {}", question);
                    return Err(ResponseCode::NotImplemented);
                }
                Ok(ResourceRecord::a(
                    question.name.clone(),
                    self.ttl,
                    self.address,
                ))
            })
            .collect()
    }
}

/// Sends each question of a request to an upstream server as its own query.
#[derive(Debug, Clone)]
pub struct Forwarder {
    upstream: SocketAddr,
    timeout: Duration,
}

impl Forwarder {
    pub fn new(upstream: SocketAddr, timeout: Duration) -> Self {
        Forwarder { upstream, timeout }
    }

    pub fn upstream(&self) -> SocketAddr {
        self.upstream
    }

    /// Collects the upstream answers for every question, in question order.
    ///
    /// A non-zero upstream RCODE is passed through to the client. Any other
    /// failure turns the whole response into `ServerFailure`; there is no retry.
    pub async fn resolve(&self, request: &Message) -> Result<Vec<ResourceRecord>, ResponseCode> {
        let mut answers = Vec::new();
        for question in request.questions() {
            match self.forward(request.header(), question).await {
                Ok(mut records) => answers.append(&mut records),
                Err(ResolveError::Upstream(code)) => {
                    debug!("Upstream {} answered {} for {}", self.upstream, code, question);
                    return Err(code);
                }
                Err(e) => {
                    warn!(
                        "Upstream {} failed for {}: {}",
                        self.upstream, question, e
                    );
                    return Err(ResponseCode::ServerFailure);
                }
            }
        }
        Ok(answers)
    }

    async fn forward(
        &self,
        header: &Header,
        question: &Question,
    ) -> Result<Vec<ResourceRecord>, ResolveError> {
        let query = Message::query(header.id, header.recursion_desired, vec![question.clone()]);
        let bytes = query.serialize()?;

        let local: SocketAddr = if self.upstream.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(self.upstream).await?;
        socket.send(&bytes).await?;

        let mut buf = vec![0u8; MAX_UDP_PAYLOAD];
        let len = timeout(self.timeout, socket.recv(&mut buf))
            .await
            .map_err(|_| ResolveError::Timeout(self.timeout))??;

        let reply = Message::parse(&buf[..len])?;
        let reply_header = reply.header();
        if reply_header.id != header.id {
            return Err(ResolveError::IdMismatch {
                expected: header.id,
                got: reply_header.id,
            });
        }
        if !reply_header.is_response {
            return Err(ResolveError::NotAResponse);
        }
        if reply.questions() != std::slice::from_ref(question) {
            return Err(ResolveError::QuestionMismatch(question.to_string()));
        }
        if reply_header.response_code != 0 {
            let code = ResponseCode::from_u8(reply_header.response_code)
                .unwrap_or(ResponseCode::ServerFailure);
            return Err(ResolveError::Upstream(code));
        }
        debug!(
            "Upstream {} returned {} answers for {}",
            self.upstream,
            reply.answers().len(),
            question
        );

        let (_, _, answers) = reply.into_parts();
        Ok(answers)
    }
}

/// Where a responder gets its answers from.
#[derive(Debug, Clone)]
pub enum Resolver {
    Static(StaticAnswers),
    Forward(Forwarder),
}

impl Resolver {
    pub fn from_config(config: &DnsConfig) -> Self {
        match config.resolver {
            Some(upstream) => Resolver::Forward(Forwarder::new(upstream, config.upstream_timeout)),
            None => Resolver::Static(StaticAnswers {
                address: config.answer_address,
                ttl: config.answer_ttl,
            }),
        }
    }

    /// Builds the response for a decoded request.
    pub async fn respond(&self, request: &Message) -> Message {
        match self {
            Resolver::Static(answers) => Message::build_response(request, answers),
            Resolver::Forward(forwarder) => {
                let resolved = match Opcode::from(request.header().opcode) {
                    Opcode::Query => forwarder.resolve(request).await,
                    _ => Ok(Vec::new()),
                };
                Message::build_response(request, &|_: &[Question]| resolved.clone())
            }
        }
    }
}
