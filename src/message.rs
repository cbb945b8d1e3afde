/// A message received from NWWS-OI.
///
/// See the [NWS Communications Header Policy Document](https://www.weather.gov/tg/awips) for
/// information about how to interpret this data.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Message {
    /// The six character WMO product ID
    pub ttaaii: String,

    /// Four character issuing center
    pub cccc: String,

    /// The six character AWIPS ID, sometimes called AFOS PIL
    pub awips_id: Option<String>,

    /// The time at which this product was issued
    pub issue: chrono::DateTime<chrono::FixedOffset>,

    /// A unique ID for this message
    ///
    /// The id contains two numbers separated by a period. The first number is the UNIX process ID
    /// on the system running the ingest process. The second number is a simple incremented
    /// sequence number for the product. Gaps in the sequence likely indicate message loss.
    pub id: String,

    /// The time at which the message was originally sent by the NWS ingest process to the NWWS-OI
    /// XMPP server, if it differs substantially from the current time.
    ///
    /// See [XEP-0203](https://xmpp.org/extensions/xep-0203.html) for more details.
    pub delay_stamp: Option<chrono::DateTime<chrono::FixedOffset>>,

    /// The LDM sequence number assigned to this product.
    ///
    /// [LDM documentation] states that this value is "[i]gnored by almost everything but existing
    /// due to tradition and history". NWWS OI seems to always prepend such a sequence number to the
    /// message body; this crate parses it out and places it here.
    pub ldm_sequence_number: Option<u32>,

    /// The contents of the message
    pub message: String,
}

impl TryFrom<xmpp_parsers::Element> for Message {
    type Error = ();

    fn try_from(value: xmpp_parsers::Element) -> Result<Self, Self::Error> {
        xmpp_parsers::message::Message::try_from(value)
            .ok()
            .and_then(|msg| Self::try_from(msg).ok())
            .ok_or(())
    }
}

impl TryFrom<xmpp_parsers::message::Message> for Message {
    type Error = xmpp_parsers::message::Message;

    fn try_from(value: xmpp_parsers::message::Message) -> std::result::Result<Self, Self::Error> {
        if value.type_ != xmpp_parsers::message::MessageType::Groupchat {
            return Err(value);
        }

        let delay_stamp = value
            .payloads
            .iter()
            .find(|p| p.is("delay", "urn:xmpp:delay"))
            .and_then(|delay| delay.attr("stamp"))
            .and_then(|v| chrono::DateTime::parse_from_rfc3339(v).ok());

        let oi = if let Some(oi) = value.payloads.iter().find(|p| p.is("x", "nwws-oi")) {
            oi
        } else {
            return Err(value);
        };

        let message = oi.text();

        // Some messages have every \n replaced with \n\n
        // Detect and undo that transformation
        let message = if message.matches("\n").count() == message.matches("\n\n").count() * 2 {
            message.replace("\n\n", "\n")
        } else {
            message
        };

        // Fish out the LDM sequence number, if any
        let (ldm_sequence_number, message) = match {
            let mut i = message.splitn(3, '\n');
            (i.next(), i.next().and_then(|s| s.parse().ok()), i.next())
        } {
            (Some(""), Some(ldm_sequence_number), Some(rest)) => {
                (Some(ldm_sequence_number), rest.into())
            }
            _ => (None, message),
        };

        return match (
            oi.attr("awipsid"),
            oi.attr("cccc"),
            oi.attr("id"),
            oi.attr("issue").map(chrono::DateTime::parse_from_rfc3339),
            oi.attr("ttaaii"),
        ) {
            (Some(awipsid), Some(cccc), Some(id), Some(Ok(issue)), Some(ttaaii)) => Ok(Self {
                awips_id: Some(awipsid).filter(|s| s.len() > 0).map(|s| s.into()),
                cccc: cccc.into(),
                id: id.into(),
                issue,
                ttaaii: ttaaii.into(),
                delay_stamp,
                ldm_sequence_number,
                message,
            }),
            _ => Err(value),
        };
    }
}
