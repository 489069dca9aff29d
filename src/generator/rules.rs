//! Routing tables and DNS block for the enhanced Clash output.
//!
//! This is product configuration, not conversion logic: the domains listed
//! here track third-party services and change on their own schedule.
//! Callers can substitute their own rule list via
//! [`super::clash_enhanced::generate_with_rules`]; whatever list is used,
//! the final entry must stay the catch-all.

use serde_yaml::{Mapping, Value};

pub const GROUP_AUTO: &str = "♻️ 自动选择";
pub const GROUP_MANUAL_1: &str = "🚀 手动切换1";
pub const GROUP_MANUAL_2: &str = "🚀 手动切换2";
pub const GROUP_FALLBACK: &str = "🔯 故障转移";
pub const GROUP_LOAD_BALANCE: &str = "🔮 负载均衡";
pub const GROUP_TELEGRAM: &str = "📲 电报消息";
pub const GROUP_AI: &str = "💬 Ai平台";
pub const GROUP_YOUTUBE: &str = "📹 油管视频";
pub const GROUP_NETFLIX: &str = "🎥 奈飞视频";
pub const GROUP_BILIBILI: &str = "📺 哔哩哔哩";
pub const GROUP_FOREIGN_MEDIA: &str = "🌍 国外媒体";
pub const GROUP_DOMESTIC_MEDIA: &str = "🌏 国内媒体";
pub const GROUP_GOOGLE: &str = "📢 谷歌服务";
pub const GROUP_MICROSOFT: &str = "Ⓜ️ 微软服务";
pub const GROUP_APPLE: &str = "🍎 苹果服务";
pub const GROUP_GAMES: &str = "🎮 游戏平台";
pub const GROUP_MUSIC: &str = "🎶 网易音乐";
pub const GROUP_DIRECT: &str = "🎯 全球直连";
pub const GROUP_REJECT: &str = "🛑 广告拦截";
pub const GROUP_FINAL: &str = "🐟 漏网之鱼";

/// Region url-test buckets, keyed by inferred country code. Order is the
/// order the groups appear in the output.
pub const REGION_GROUPS: [(&str, &str); 6] = [
    ("HK", "🇭🇰 香港节点"),
    ("JP", "🇯🇵 日本节点"),
    ("US", "🇺🇸 美国节点"),
    ("SG", "🇸🇬 狮城节点"),
    ("KR", "🇰🇷 韩国节点"),
    ("TW", "🇹🇼 台湾节点"),
];

pub const PROBE_URL: &str = "https://www.gstatic.com/generate_204";

/// Default rule table. Ordering is significant for the client; the last
/// rule is always the catch-all.
pub const DEFAULT_RULES: [&str; 50] = [
    // Local networks
    "DOMAIN-SUFFIX,local,🎯 全球直连",
    "IP-CIDR,127.0.0.0/8,🎯 全球直连",
    "IP-CIDR,172.16.0.0/12,🎯 全球直连",
    "IP-CIDR,192.168.0.0/16,🎯 全球直连",
    "IP-CIDR,10.0.0.0/8,🎯 全球直连",
    "IP-CIDR,17.0.0.0/8,🎯 全球直连",
    "IP-CIDR,100.64.0.0/10,🎯 全球直连",
    // Telegram
    "DOMAIN-SUFFIX,t.me,📲 电报消息",
    "DOMAIN-SUFFIX,tdesktop.com,📲 电报消息",
    "DOMAIN-SUFFIX,telegra.ph,📲 电报消息",
    "DOMAIN-SUFFIX,telegram.org,📲 电报消息",
    // AI platforms
    "DOMAIN-SUFFIX,openai.com,💬 Ai平台",
    "DOMAIN-SUFFIX,chatgpt.com,💬 Ai平台",
    "DOMAIN-SUFFIX,claude.ai,💬 Ai平台",
    "DOMAIN-SUFFIX,anthropic.com,💬 Ai平台",
    "DOMAIN-SUFFIX,poe.com,💬 Ai平台",
    // YouTube
    "DOMAIN-SUFFIX,youtube.com,📹 油管视频",
    "DOMAIN-SUFFIX,googlevideo.com,📹 油管视频",
    "DOMAIN-SUFFIX,youtube-nocookie.com,📹 油管视频",
    "DOMAIN-SUFFIX,ytimg.com,📹 油管视频",
    // Netflix
    "DOMAIN-SUFFIX,netflix.com,🎥 奈飞视频",
    "DOMAIN-SUFFIX,nflximg.net,🎥 奈飞视频",
    "DOMAIN-SUFFIX,nflxext.com,🎥 奈飞视频",
    "DOMAIN-SUFFIX,nflxso.net,🎥 奈飞视频",
    // Bilibili
    "DOMAIN-SUFFIX,bilibili.com,📺 哔哩哔哩",
    "DOMAIN-SUFFIX,bilivideo.com,📺 哔哩哔哩",
    "DOMAIN-SUFFIX,hdslb.com,📺 哔哩哔哩",
    // Google
    "DOMAIN-SUFFIX,google.com,📢 谷歌服务",
    "DOMAIN-SUFFIX,googleapis.com,📢 谷歌服务",
    "DOMAIN-SUFFIX,googleusercontent.com,📢 谷歌服务",
    "DOMAIN-SUFFIX,gstatic.com,📢 谷歌服务",
    "DOMAIN-SUFFIX,googletagmanager.com,📢 谷歌服务",
    "DOMAIN-SUFFIX,googletagservices.com,📢 谷歌服务",
    // Microsoft
    "DOMAIN-SUFFIX,microsoft.com,Ⓜ️ 微软服务",
    "DOMAIN-SUFFIX,office.com,Ⓜ️ 微软服务",
    "DOMAIN-SUFFIX,outlook.com,Ⓜ️ 微软服务",
    "DOMAIN-SUFFIX,onedrive.com,Ⓜ️ 微软服务",
    "DOMAIN-SUFFIX,skype.com,Ⓜ️ 微软服务",
    // Apple
    "DOMAIN-SUFFIX,apple.com,🍎 苹果服务",
    "DOMAIN-SUFFIX,icloud.com,🍎 苹果服务",
    "DOMAIN-SUFFIX,itunes.com,🍎 苹果服务",
    "DOMAIN-SUFFIX,appstore.com,🍎 苹果服务",
    // Gaming
    "DOMAIN-SUFFIX,steampowered.com,🎮 游戏平台",
    "DOMAIN-SUFFIX,epicgames.com,🎮 游戏平台",
    "DOMAIN-SUFFIX,ea.com,🎮 游戏平台",
    // Music
    "DOMAIN-SUFFIX,music.163.com,🎶 网易音乐",
    "DOMAIN-SUFFIX,music.126.net,🎶 网易音乐",
    "DOMAIN-SUFFIX,spotify.com,🎶 网易音乐",
    // China mainland, then the catch-all
    "GEOIP,CN,🎯 全球直连",
    "MATCH,🐟 漏网之鱼",
];

/// Fixed DNS block embedded in the enhanced output.
pub fn default_dns() -> Mapping {
    let mut dns = Mapping::new();
    dns.insert("enable".into(), true.into());
    dns.insert("listen".into(), "0.0.0.0:1053".into());
    dns.insert(
        "default-nameserver".into(),
        str_seq(&["223.5.5.5", "8.8.8.8", "1.1.1.1"]),
    );
    dns.insert(
        "proxy-server-nameserver".into(),
        str_seq(&["https://dns.alidns.com/dns-query"]),
    );

    let mut policy = Mapping::new();
    policy.insert(
        "geosite:gfw,geolocation-!cn".into(),
        str_seq(&[
            "https://1.1.1.1/dns-query",
            "https://1.0.0.1/dns-query",
            "https://8.8.8.8/dns-query",
        ]),
    );
    dns.insert("nameserver-policy".into(), Value::Mapping(policy));

    dns.insert(
        "nameserver".into(),
        str_seq(&[
            "https://dns.alidns.com/dns-query",
            "https://doh.pub/dns-query",
            "https://8.8.8.8/dns-query",
        ]),
    );
    dns.insert(
        "fallback".into(),
        str_seq(&[
            "https://1.1.1.1/dns-query",
            "https://1.0.0.1/dns-query",
            "https://8.8.8.8/dns-query",
        ]),
    );

    let mut fallback_filter = Mapping::new();
    fallback_filter.insert("geoip".into(), false.into());
    fallback_filter.insert("geoip-code".into(), "CN".into());
    fallback_filter.insert("ipcidr".into(), str_seq(&["240.0.0.0/4"]));
    dns.insert("fallback-filter".into(), Value::Mapping(fallback_filter));

    dns.insert(
        "fake-ip-filter".into(),
        str_seq(&["+.lan", "+.microsoft*.com", "localhost.ptlogin2.qq.com"]),
    );

    dns
}

fn str_seq(items: &[&str]) -> Value {
    Value::Sequence(items.iter().map(|s| (*s).into()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules_end_with_catch_all() {
        assert_eq!(*DEFAULT_RULES.last().unwrap(), "MATCH,🐟 漏网之鱼");
    }

    #[test]
    fn test_default_dns_shape() {
        let dns = Value::Mapping(default_dns());
        assert_eq!(dns["enable"], Value::from(true));
        assert!(dns["nameserver"].as_sequence().unwrap().len() >= 2);
        assert_eq!(dns["fallback-filter"]["geoip-code"], Value::from("CN"));
    }
}
