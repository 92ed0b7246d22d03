//! Message types for the coprocessor link
//!
//! Message types are divided into two categories:
//! - MCU → coprocessor: session control and provisioning requests
//! - Coprocessor → MCU: results, liveness, inbound messages
//!
//! Structured payloads are postcard-encoded.

use marquee_core::config::{BrokerSettings, PortalSettings};
use serde::Serialize;

use crate::frame::{Frame, FrameError, MAX_PAYLOAD_SIZE};

// Message type IDs: MCU → coprocessor
pub const MSG_CONFIGURE: u8 = 0x01;
pub const MSG_CONNECT: u8 = 0x02;
pub const MSG_DISCONNECT: u8 = 0x03;
pub const MSG_PING: u8 = 0x04;
pub const MSG_CONFIGURE_PORTAL: u8 = 0x05;
pub const MSG_START_PORTAL: u8 = 0x06;

// Message type IDs: coprocessor → MCU
pub const MSG_CONNECT_RESULT: u8 = 0x81;
pub const MSG_PONG: u8 = 0x82;
pub const MSG_LINK_STATUS: u8 = 0x83;
pub const MSG_INBOUND: u8 = 0x84;
pub const MSG_PORTAL_COMPLETE: u8 = 0x85;
pub const MSG_PORTAL_TIMEOUT: u8 = 0x86;

#[derive(Serialize)]
struct StartPortal<'a> {
    timeout_s: u16,
    defaults: &'a BrokerSettings,
}

fn encode<T: Serialize>(msg_type: u8, value: &T) -> Result<Frame, FrameError> {
    let mut buffer = [0u8; MAX_PAYLOAD_SIZE];
    let used = postcard::to_slice(value, &mut buffer).map_err(|_| FrameError::PayloadTooLarge)?;
    Frame::new(msg_type, used)
}

/// Requests from the MCU to the coprocessor
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request<'a> {
    /// Install broker session settings
    Configure(&'a BrokerSettings),
    /// Join the network and open the broker session
    Connect,
    /// Close the session
    Disconnect,
    /// Probe the broker session
    Ping,
    /// Install access-point settings for the portal
    ConfigurePortal(&'a PortalSettings),
    /// Run the provisioning portal, pre-filled with `defaults`
    StartPortal {
        timeout_s: u16,
        defaults: &'a BrokerSettings,
    },
}

impl<'a> Request<'a> {
    /// Encode this request into a frame
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        match self {
            Request::Configure(broker) => encode(MSG_CONFIGURE, *broker),
            Request::Connect => Ok(Frame::empty(MSG_CONNECT)),
            Request::Disconnect => Ok(Frame::empty(MSG_DISCONNECT)),
            Request::Ping => Ok(Frame::empty(MSG_PING)),
            Request::ConfigurePortal(portal) => encode(MSG_CONFIGURE_PORTAL, *portal),
            Request::StartPortal {
                timeout_s,
                defaults,
            } => encode(
                MSG_START_PORTAL,
                &StartPortal {
                    timeout_s: *timeout_s,
                    defaults,
                },
            ),
        }
    }
}

/// Replies and notifications from the coprocessor
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reply<'a> {
    /// Outcome of a connect request (0 ok, 1..=0x7F transient, 0x80.. fatal)
    ConnectResult(u8),
    /// Outcome of a ping request
    Pong(bool),
    /// Unsolicited session state change
    LinkStatus(bool),
    /// Message received on the subscribed topic
    Inbound(&'a [u8]),
    /// Portal finished with new broker settings
    PortalComplete(BrokerSettings),
    /// Portal closed without being completed
    PortalTimeout,
}

impl<'a> Reply<'a> {
    /// Parse a reply from a frame
    pub fn from_frame(frame: &'a Frame) -> Result<Self, FrameError> {
        let flag = |frame: &Frame| -> Result<bool, FrameError> {
            match frame.payload.first() {
                Some(&byte) => Ok(byte != 0),
                None => Err(FrameError::InvalidFrame),
            }
        };

        match frame.msg_type {
            MSG_CONNECT_RESULT => frame
                .payload
                .first()
                .map(|&code| Reply::ConnectResult(code))
                .ok_or(FrameError::InvalidFrame),
            MSG_PONG => Ok(Reply::Pong(flag(frame)?)),
            MSG_LINK_STATUS => Ok(Reply::LinkStatus(flag(frame)?)),
            MSG_INBOUND => Ok(Reply::Inbound(&frame.payload)),
            MSG_PORTAL_COMPLETE => postcard::from_bytes(&frame.payload)
                .map(Reply::PortalComplete)
                .map_err(|_| FrameError::InvalidFrame),
            MSG_PORTAL_TIMEOUT => Ok(Reply::PortalTimeout),
            _ => Err(FrameError::InvalidFrame),
        }
    }

    /// Encode this reply into a frame (for testing or simulation)
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        match self {
            Reply::ConnectResult(code) => Frame::new(MSG_CONNECT_RESULT, &[*code]),
            Reply::Pong(alive) => Frame::new(MSG_PONG, &[*alive as u8]),
            Reply::LinkStatus(up) => Frame::new(MSG_LINK_STATUS, &[*up as u8]),
            Reply::Inbound(payload) => Frame::new(MSG_INBOUND, payload),
            Reply::PortalComplete(broker) => encode(MSG_PORTAL_COMPLETE, broker),
            Reply::PortalTimeout => Ok(Frame::empty(MSG_PORTAL_TIMEOUT)),
        }
    }
}

/// Decode the payload of a [`Request::StartPortal`] frame
pub fn decode_start_portal(frame: &Frame) -> Result<(u16, BrokerSettings), FrameError> {
    if frame.msg_type != MSG_START_PORTAL {
        return Err(FrameError::InvalidFrame);
    }
    let (timeout_s, defaults): (u16, BrokerSettings) =
        postcard::from_bytes(&frame.payload).map_err(|_| FrameError::InvalidFrame)?;
    Ok((timeout_s, defaults))
}
