use std::fmt;

use calypso_core::{Extension, Imsi, SubscriberId};

/// How a command's reply is to be judged, see [`crate::classify`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// `show subscriber ...`
    Lookup,
    /// `subscriber id <id> extension <ext>`
    AssignById,
    /// `subscriber imsi <imsi> extension <ext>`
    AssignByImsi,
    Create,
    /// sms, silent-sms and ussd-notify
    Deliver,
    Sync,
    Privilege,
}

/// Receiver of an SMS sent from the console
#[derive(Debug, Clone, Copy)]
pub enum SmsTarget<'a> {
    Id(SubscriberId),
    Extension(&'a Extension),
}

/// Every VTY command line the tools issue.
#[derive(Debug, Clone)]
pub enum VtyCommand<'a> {
    ShowSubscriberById(SubscriberId),
    ShowSubscriberByImsi(&'a Imsi),
    ShowSubscriberByExtension(&'a Extension),
    CreateSubscriber(&'a Imsi),
    SetExtensionById { id: SubscriberId, extension: &'a Extension },
    SetExtensionByImsi { imsi: &'a Imsi, extension: &'a Extension },
    SendSms { target: SmsTarget<'a>, sender: &'a Extension, text: &'a str },
    SendSilentSms { target: &'a Extension, sender: &'a Imsi, text: &'a str },
    UssdNotify { target: &'a Extension, ussd_type: u8, text: &'a str },
    Sync,
    Enable,
    Disable,
    Exit,
}

impl VtyCommand<'_> {
    pub fn kind(&self) -> CommandKind {
        match self {
            VtyCommand::ShowSubscriberById(_) | VtyCommand::ShowSubscriberByImsi(_) | VtyCommand::ShowSubscriberByExtension(_) => {
                CommandKind::Lookup
            }
            VtyCommand::CreateSubscriber(_) => CommandKind::Create,
            VtyCommand::SetExtensionById { .. } => CommandKind::AssignById,
            VtyCommand::SetExtensionByImsi { .. } => CommandKind::AssignByImsi,
            VtyCommand::SendSms { .. } | VtyCommand::SendSilentSms { .. } | VtyCommand::UssdNotify { .. } => CommandKind::Deliver,
            VtyCommand::Sync => CommandKind::Sync,
            VtyCommand::Enable | VtyCommand::Disable | VtyCommand::Exit => CommandKind::Privilege,
        }
    }

    /// The command as written to the console, without the trailing newline
    pub fn to_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for VtyCommand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VtyCommand::ShowSubscriberById(id) => write!(f, "show subscriber id {}", id),
            VtyCommand::ShowSubscriberByImsi(imsi) => write!(f, "show subscriber imsi {}", imsi),
            VtyCommand::ShowSubscriberByExtension(ext) => write!(f, "show subscriber extension {}", ext),
            VtyCommand::CreateSubscriber(imsi) => write!(f, "subscriber create imsi {}", imsi),
            VtyCommand::SetExtensionById { id, extension } => write!(f, "subscriber id {} extension {}", id, extension),
            VtyCommand::SetExtensionByImsi { imsi, extension } => write!(f, "subscriber imsi {} extension {}", imsi, extension),
            VtyCommand::SendSms { target, sender, text } => {
                match target {
                    SmsTarget::Id(id) => write!(f, "subscriber id {}", id)?,
                    SmsTarget::Extension(ext) => write!(f, "subscriber extension {}", ext)?,
                }
                write!(f, " sms sender extension {} send {}", sender, one_line(text))
            }
            VtyCommand::SendSilentSms { target, sender, text } => {
                write!(f, "subscriber extension {} silent-sms sender imsi {} send {}", target, sender, one_line(text))
            }
            VtyCommand::UssdNotify { target, ussd_type, text } => {
                write!(f, "subscriber extension {} ussd-notify {} \"{}\"", target, ussd_type, one_line(text).replace('"', "'"))
            }
            VtyCommand::Sync => f.write_str("subscriber sync"),
            VtyCommand::Enable => f.write_str("enable"),
            VtyCommand::Disable => f.write_str("disable"),
            VtyCommand::Exit => f.write_str("exit"),
        }
    }
}

/// A newline would end the command early and turn the rest into a second one
fn one_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}
